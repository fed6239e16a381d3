///
/// Column value marshalling: native field -> script `Value`.
///
/// | native field           | value                       |
/// |------------------------|-----------------------------|
/// | null                   | `Null`                      |
/// | integer, unsigned flag | `UInt`                      |
/// | integer                | `Int`                       |
/// | decimal                | `Float`                     |
/// | binary                 | `Bytes` (copied)            |
/// | datetime               | `Date` (seconds * 1000)     |
/// | anything else          | `String` (driver rendering) |
///

use naml_std_core::Value;

use crate::driver::{Cursor, FieldKind};

pub fn field_value(cursor: &dyn Cursor, field: usize) -> Value {
    if cursor.is_null(field) {
        return Value::Null;
    }
    match cursor.field_kind(field) {
        FieldKind::Integer if cursor.field_attributes(field).unsigned => {
            Value::UInt(cursor.get_u64(field))
        }
        FieldKind::Integer => Value::Int(cursor.get_i64(field)),
        FieldKind::Decimal => Value::Float(cursor.get_f64(field)),
        FieldKind::Binary => {
            Value::Bytes(cursor.get_binary(field).map(<[u8]>::to_vec).unwrap_or_default())
        }
        FieldKind::Datetime => Value::Date(cursor.get_datetime(field).saturating_mul(1000)),
        FieldKind::String | FieldKind::Boolean => {
            Value::String(cursor.get_string(field).map(|s| s.into_owned()).unwrap_or_default())
        }
    }
}

/// Every field of the current row, in column order
pub fn row_values(cursor: &dyn Cursor) -> Vec<Value> {
    (0..cursor.field_count()).map(|i| field_value(cursor, i)).collect()
}
