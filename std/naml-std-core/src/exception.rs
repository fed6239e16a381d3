//!
//! Host Exception Kinds
//!
//! Native std crates report failures as typed Rust errors; at the script
//! boundary each error is thrown as one of the host exception classes
//! below. The numeric IDs are what the runtime's `is` checks compare.
//!
//! Exception Type IDs:
//! - 0: Unknown/User-defined exception
//! - 1: TypeError (wrong argument count or kind)
//! - 2: InternalError (native library failure)
//! - 3: DBError (database driver or handle failure)
//!

use std::fmt;

pub const EXCEPTION_TYPE_UNKNOWN: i64 = 0;
pub const EXCEPTION_TYPE_TYPE_ERROR: i64 = 1;
pub const EXCEPTION_TYPE_INTERNAL_ERROR: i64 = 2;
pub const EXCEPTION_TYPE_DB_ERROR: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Unknown,
    TypeError,
    InternalError,
    DbError,
}

impl ExceptionKind {
    pub fn type_id(self) -> i64 {
        match self {
            ExceptionKind::Unknown => EXCEPTION_TYPE_UNKNOWN,
            ExceptionKind::TypeError => EXCEPTION_TYPE_TYPE_ERROR,
            ExceptionKind::InternalError => EXCEPTION_TYPE_INTERNAL_ERROR,
            ExceptionKind::DbError => EXCEPTION_TYPE_DB_ERROR,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            ExceptionKind::Unknown => "Error",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::InternalError => "InternalError",
            ExceptionKind::DbError => "DBError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}
