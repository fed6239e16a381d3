///
/// # Connection Options and Config Files
///
/// `ConnectOptions` is the ordered key/value set handed verbatim to the
/// driver's option setter. It is built from a script object (every value
/// string-coerced) or loaded as part of a `ConnectionConfig` TOML file:
///
/// ```toml
/// driver = "sqlite3"
///
/// [options]
/// dbname = "app.sqlite3"
/// sqlite3_dbdir = "/var/lib/app"
/// sqlite3_timeout = 500
/// ```
///
/// TOML option values may be strings, integers, floats or booleans; they
/// are coerced to text the same way script values are.
///

use std::path::Path;

use indexmap::IndexMap;
use naml_std_core::Value;
use serde::Deserialize;

use crate::errors::DbiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    entries: IndexMap<String, String>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Own properties of a script object, values string-coerced.
    /// Object kinds without string-keyed properties give an empty set.
    pub fn from_value(options: &Value) -> Result<Self, DbiError> {
        if !options.is_object() {
            return Err(DbiError::Usage(
                "Second argument must be an object of connection options".to_string(),
            ));
        }
        let mut out = Self::new();
        if let Value::Object(map) = options {
            for (key, value) in map {
                out.set(key.clone(), value.to_display_string());
            }
        }
        Ok(out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.set(k, v);
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl OptionValue {
    fn into_text(self) -> String {
        match self {
            OptionValue::Text(s) => s,
            OptionValue::Integer(i) => Value::Int(i).to_display_string(),
            OptionValue::Float(f) => Value::Float(f).to_display_string(),
            OptionValue::Bool(b) => Value::Bool(b).to_display_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    driver: String,
    #[serde(default)]
    options: IndexMap<String, OptionValue>,
}

/// A driver name plus its connection options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub driver: String,
    pub options: ConnectOptions,
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>, options: ConnectOptions) -> Self {
        Self {
            driver: driver.into(),
            options,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DbiError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| DbiError::InvalidConfig(e.to_string()))?;
        if raw.driver.trim().is_empty() {
            return Err(DbiError::InvalidConfig("driver name is empty".to_string()));
        }
        Ok(Self {
            driver: raw.driver,
            options: raw
                .options
                .into_iter()
                .map(|(k, v)| (k, v.into_text()))
                .collect(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, DbiError> {
        let content = std::fs::read_to_string(path).map_err(|source| DbiError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
