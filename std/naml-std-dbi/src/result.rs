///
/// # Result Handle
///
/// A `ResultSet` names its cursor by slot key in the owning connection's
/// arena. It is valid while the owner is alive, open, and still holds that
/// exact slot generation; every accessor checks this first and fails with
/// the invalid-handle error otherwise.
///

use std::cell::RefCell;
use std::rc::Weak;

use naml_std_core::{SlotKey, Value};
use tracing::trace;

use crate::connection::ConnectionState;
use crate::driver::Cursor;
use crate::errors::DbiError;
use crate::marshal::{field_value, row_values};

/// Column addressed by zero-based position or by exact name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Index(i64),
    Name(String),
}

impl ColumnSelector {
    /// Numbers truncate toward zero; any other value is looked up by its
    /// string form.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(i) => ColumnSelector::Index(*i),
            Value::UInt(u) => ColumnSelector::Index(i64::try_from(*u).unwrap_or(i64::MAX)),
            Value::Float(f) => ColumnSelector::Index(f.trunc() as i64),
            other => ColumnSelector::Name(other.to_display_string()),
        }
    }

    fn resolve(&self, cursor: &dyn Cursor) -> Option<usize> {
        match self {
            ColumnSelector::Index(i) => {
                usize::try_from(*i).ok().filter(|&i| i < cursor.field_count())
            }
            ColumnSelector::Name(name) => cursor.field_index(name),
        }
    }
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        ColumnSelector::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<i64> for ColumnSelector {
    fn from(index: i64) -> Self {
        ColumnSelector::Index(index)
    }
}

impl From<i32> for ColumnSelector {
    fn from(index: i32) -> Self {
        ColumnSelector::Index(index.into())
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        ColumnSelector::Name(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        ColumnSelector::Name(name)
    }
}

impl From<&Value> for ColumnSelector {
    fn from(value: &Value) -> Self {
        ColumnSelector::from_value(value)
    }
}

pub struct ResultSet {
    owner: Weak<RefCell<ConnectionState>>,
    key: SlotKey,
}

impl ResultSet {
    pub(crate) fn new(owner: Weak<RefCell<ConnectionState>>, key: SlotKey) -> Self {
        Self { owner, key }
    }

    fn with_cursor<R>(&self, f: impl FnOnce(&mut dyn Cursor) -> R) -> Result<R, DbiError> {
        let owner = self.owner.upgrade().ok_or_else(DbiError::invalid_result)?;
        let mut state = owner.borrow_mut();
        if state.session.is_none() {
            return Err(DbiError::invalid_result());
        }
        let cursor = state.results.get_mut(self.key).ok_or_else(DbiError::invalid_result)?;
        Ok(f(&mut **cursor))
    }

    pub fn is_valid(&self) -> bool {
        self.with_cursor(|_| ()).is_ok()
    }

    /// Step to the next row. `false` once there are no more rows.
    pub fn advance(&self) -> Result<bool, DbiError> {
        self.with_cursor(|cursor| cursor.next_row())
    }

    pub fn field_count(&self) -> Result<usize, DbiError> {
        self.with_cursor(|cursor| cursor.field_count())
    }

    pub fn row_count(&self) -> Result<u64, DbiError> {
        self.with_cursor(|cursor| cursor.row_count())
    }

    pub fn field_names(&self) -> Result<Vec<String>, DbiError> {
        self.with_cursor(|cursor| column_names(cursor))
    }

    /// Value of one column in the current row. `Undefined` for a column
    /// that does not exist or when no row is current.
    pub fn get(&self, selector: impl Into<ColumnSelector>) -> Result<Value, DbiError> {
        let selector = selector.into();
        self.with_cursor(|cursor| {
            if !cursor.has_row() {
                return Value::Undefined;
            }
            match selector.resolve(cursor) {
                Some(field) => field_value(cursor, field),
                None => Value::Undefined,
            }
        })
    }

    /// Rewind and collect every row, as arrays or as name-keyed records.
    /// The cursor is left on the last row.
    pub fn to_array(&self, as_records: bool) -> Result<Vec<Value>, DbiError> {
        self.with_cursor(|cursor| {
            if !cursor.first_row() {
                return Vec::new();
            }
            let names = if as_records { column_names(cursor) } else { Vec::new() };
            let mut rows = Vec::new();
            loop {
                let values = row_values(cursor);
                rows.push(if as_records {
                    Value::Object(names.iter().cloned().zip(values).collect())
                } else {
                    Value::Array(values)
                });
                if !cursor.next_row() {
                    break;
                }
            }
            rows
        })
    }
}

fn column_names(cursor: &dyn Cursor) -> Vec<String> {
    (0..cursor.field_count())
        .map(|i| cursor.field_name(i).unwrap_or_default().to_string())
        .collect()
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        let Some(owner) = self.owner.upgrade() else {
            return;
        };
        // Already borrowed means the owner is mid-teardown and frees us itself
        let Ok(mut state) = owner.try_borrow_mut() else {
            return;
        };
        let cursor = state.results.remove(self.key);
        drop(state);
        if cursor.is_some() {
            trace!(slot = self.key.index(), "result released");
        }
    }
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("slot", &self.key.index())
            .field("valid", &self.is_valid())
            .finish()
    }
}
