//!
//! Script Value Representation
//!
//! Values crossing the boundary between naml scripts and native std crates
//! are carried as a `Value`. The set of kinds mirrors what a dynamically
//! typed host can hand over: the two "nothing" markers, scalars, text,
//! raw byte buffers and views over them, dates, arrays and plain objects.
//!
//! Objects keep insertion order (like script object literals), which keeps
//! row records stable when they are printed or compared.
//!

use indexmap::IndexMap;

use crate::bytes::TypedArray;

/// Insertion-ordered string-keyed map used for script objects
pub type Object = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// An owned array buffer
    Bytes(Vec<u8>),
    TypedArray(TypedArray),
    /// Milliseconds since the Unix epoch (UTC)
    Date(i64),
    Array(Vec<Value>),
    Object(Object),
}

/// Static shared `Undefined`, handed out for missing properties
static UNDEFINED: Value = Value::Undefined;

impl Value {
    /// Build an array value from anything yielding values
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build an object value from key/value pairs, keeping their order
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for every kind the host treats as a (non-array) object:
    /// plain objects, byte buffers, typed array views and dates.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Object(_) | Value::Bytes(_) | Value::TypedArray(_) | Value::Date(_)
        )
    }

    /// Own property lookup. Anything that is not a plain object has no
    /// string-keyed properties, so the lookup yields `Undefined`.
    pub fn property(&self, name: &str) -> &Value {
        match self {
            Value::Object(map) => map.get(name).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Byte content of a buffer or view. `None` for other kinds and for
    /// views whose window no longer fits their buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes.as_slice()),
            Value::TypedArray(view) => view.bytes(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => u64::try_from(*a).is_ok_and(|a| a == *b),
            (Float(a), Float(b)) => a == b,
            (Float(f), Int(i)) | (Int(i), Float(f)) => *f == *i as f64,
            (Float(f), UInt(u)) | (UInt(u), Float(f)) => *f == *u as f64,
            (String(a), String(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (a, b) => match (a.as_bytes(), b.as_bytes()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<TypedArray> for Value {
    fn from(view: TypedArray) -> Self {
        Value::TypedArray(view)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
