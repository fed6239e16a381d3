///
/// Native driver abstraction.
///
/// The bridge talks to databases through three traits, modelled on the
/// libdbi object split:
/// - `Driver`: a loadable backend, shared process-wide, creates sessions
/// - `Session`: one native connection; options, connect, query, close
/// - `Cursor`: one executed query's result set
///
/// Everything is synchronous. Field positions are zero-based and a fresh
/// cursor sits before its first row.
///

use std::borrow::Cow;

use thiserror::Error;

/// Error text reported by a native driver
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type NativeResult<T> = Result<T, NativeError>;

/// Column type as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
    String,
    Binary,
    Datetime,
    Boolean,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldAttributes {
    pub unsigned: bool,
}

pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    /// Allocate an unconnected session
    fn new_session(&self) -> NativeResult<Box<dyn Session>>;
}

pub trait Session {
    fn driver_name(&self) -> &str;

    fn set_option(&mut self, key: &str, value: &str);

    fn option(&self, key: &str) -> Option<&str>;

    fn connect(&mut self) -> NativeResult<()>;

    /// Execute `sql` and return its result cursor
    fn query(&mut self, sql: &str) -> NativeResult<Box<dyn Cursor>>;

    /// Release the native connection. Called at most once by the bridge.
    fn close(&mut self);
}

pub trait Cursor {
    /// Move to the next row; false once past the last row
    fn next_row(&mut self) -> bool;

    /// Rewind to the first row; false if the result has no rows
    fn first_row(&mut self) -> bool;

    fn field_count(&self) -> usize;

    fn row_count(&self) -> u64;

    fn field_name(&self, field: usize) -> Option<&str>;

    fn field_index(&self, name: &str) -> Option<usize>;

    fn field_kind(&self, field: usize) -> FieldKind;

    fn field_attributes(&self, field: usize) -> FieldAttributes;

    /// True when there is no current row or the field is SQL NULL
    fn is_null(&self, field: usize) -> bool;

    fn get_i64(&self, field: usize) -> i64;

    fn get_u64(&self, field: usize) -> u64;

    fn get_f64(&self, field: usize) -> f64;

    fn get_binary(&self, field: usize) -> Option<&[u8]>;

    /// Seconds since the Unix epoch
    fn get_datetime(&self, field: usize) -> i64;

    fn get_string(&self, field: usize) -> Option<Cow<'_, str>>;

    /// True while the cursor is positioned on a row
    fn has_row(&self) -> bool;
}
