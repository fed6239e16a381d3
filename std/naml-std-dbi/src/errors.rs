///
/// Database bridge error types.
///
/// Failures that reach the script as thrown exceptions: bad call shapes,
/// unknown drivers, sessions that cannot be created or connected, and
/// operations on handles that have been invalidated. Query execution
/// failures are deliberately absent; they surface as `None` / `false`.
///

use std::fmt;
use std::path::PathBuf;

use naml_std_core::ExceptionKind;
use thiserror::Error;

/// Which script-visible handle an invalid-handle error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Connection,
    Result,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Connection => f.write_str("Connection"),
            HandleKind::Result => f.write_str("Result"),
        }
    }
}

/// Coarse error category, one per failure class a caller can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    DriverResolution,
    Connection,
    InvalidHandle,
    Config,
}

#[derive(Debug, Error)]
pub enum DbiError {
    #[error("{0}")]
    Usage(String),

    #[error("Unable to load DBI driver '{driver}'")]
    DriverNotFound { driver: String },

    #[error("Unable to create DBI connection for driver '{driver}': {reason}")]
    SessionCreate { driver: String, reason: String },

    #[error("DB connection failed ({driver}, {dbname}): {reason}")]
    ConnectFailed {
        driver: String,
        dbname: String,
        reason: String,
    },

    #[error("{handle} handle is no longer valid")]
    InvalidHandle { handle: HandleKind },

    #[error("Failed to read connection config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid connection config: {0}")]
    InvalidConfig(String),
}

impl DbiError {
    pub fn invalid_connection() -> Self {
        DbiError::InvalidHandle {
            handle: HandleKind::Connection,
        }
    }

    pub fn invalid_result() -> Self {
        DbiError::InvalidHandle {
            handle: HandleKind::Result,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbiError::Usage(_) => ErrorKind::Usage,
            DbiError::DriverNotFound { .. } => ErrorKind::DriverResolution,
            DbiError::SessionCreate { .. } | DbiError::ConnectFailed { .. } => {
                ErrorKind::Connection
            }
            DbiError::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            DbiError::ConfigRead { .. } | DbiError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Host exception class this error is thrown as
    pub fn exception_kind(&self) -> ExceptionKind {
        match self.kind() {
            ErrorKind::Usage => ExceptionKind::TypeError,
            ErrorKind::InvalidHandle => ExceptionKind::DbError,
            ErrorKind::DriverResolution | ErrorKind::Connection | ErrorKind::Config => {
                ExceptionKind::InternalError
            }
        }
    }
}
