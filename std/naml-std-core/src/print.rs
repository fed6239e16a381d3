///
/// Value Printing
///
/// Two renderings of script values:
/// - `to_display_string` is the host's string coercion, used wherever a
///   native API needs text from an arbitrary value (option maps, names)
/// - `to_json` mirrors `JSON.stringify` and is what `print`/`println`
///   show for structured values
///

use chrono::{DateTime, SecondsFormat};

use crate::value::Value;

impl Value {
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => format_number(*f),
            Value::String(s) => s.clone(),
            Value::Bytes(_) => "[object ArrayBuffer]".to_string(),
            Value::TypedArray(view) => format!("[object {}]", view.kind().class_name()),
            Value::Date(ms) => format_date(*ms).unwrap_or_else(|| "Invalid Date".to_string()),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::UInt(u) => Json::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(ms) => format_date(*ms).map_or(Json::Null, Json::String),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Bytes(_) | Value::TypedArray(_) => Json::Object(serde_json::Map::new()),
        }
    }
}

/// Shortest round-trip number text with the host's spellings for
/// non-finite values and exponent form at the usual thresholds
fn format_number(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", f);
    }
    let text = format!("{:e}", f);
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => text,
    }
}

/// ISO-8601 UTC with millisecond precision, `None` when out of range
fn format_date(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
