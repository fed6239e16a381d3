///
/// SQL literal encoding for script values.
///
/// Every value maps to some valid SQL literal and encoding never fails:
/// kinds with no literal form become `NULL` rather than anything that
/// could splice unescaped text into a query.
///
/// | kind               | literal                               |
/// |--------------------|---------------------------------------|
/// | undefined, null    | `NULL`                                |
/// | bool               | `1` / `0`                             |
/// | int, uint          | decimal                               |
/// | float              | `%.17g`; NaN and infinities are `NULL`|
/// | string             | `'...'` with `'` doubled              |
/// | bytes, typed array | `X'..'` uppercase hex, empty is `NULL`|
/// | anything else      | `NULL`                                |
///

use std::fmt::Write;

use naml_std_core::Value;

/// Significant digits for float literals (round-trips every f64)
const FLOAT_DIGITS: usize = 17;

pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

pub fn encode_into(value: &Value, out: &mut String) {
    match value {
        Value::Undefined | Value::Null => out.push_str("NULL"),
        Value::Bool(b) => out.push(if *b { '1' } else { '0' }),
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Value::UInt(u) => {
            let _ = write!(out, "{}", u);
        }
        Value::Float(f) => push_float(*f, out),
        Value::String(s) => push_text(s, out),
        Value::Bytes(_) | Value::TypedArray(_) => match value.as_bytes() {
            Some(bytes) if !bytes.is_empty() => push_blob(bytes, out),
            _ => out.push_str("NULL"),
        },
        Value::Date(_) | Value::Array(_) | Value::Object(_) => out.push_str("NULL"),
    }
}

/// C `%.17g`: 17 significant digits, trailing zeros dropped, exponent
/// form when the decimal exponent is below -4 or at least 17.
fn push_float(f: f64, out: &mut String) {
    if !f.is_finite() {
        out.push_str("NULL");
        return;
    }
    if f == 0.0 {
        out.push_str(if f.is_sign_negative() { "-0" } else { "0" });
        return;
    }

    let sci = format!("{:.*e}", FLOAT_DIGITS - 1, f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        let _ = write!(out, "{}", f);
        return;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= FLOAT_DIGITS as i32 {
        out.push_str(trim_fraction(mantissa));
        let _ = write!(out, "e{}{:02}", if exp < 0 { '-' } else { '+' }, exp.unsigned_abs());
    } else {
        let precision = (FLOAT_DIGITS as i32 - 1 - exp) as usize;
        let fixed = format!("{:.*}", precision, f);
        out.push_str(trim_fraction(&fixed));
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Text stops at the first NUL, like the C string the driver will see
fn push_text(s: &str, out: &mut String) {
    let text = s.split('\0').next().unwrap_or("");
    out.reserve(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

fn push_blob(bytes: &[u8], out: &mut String) {
    out.reserve(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out.push('\'');
}
