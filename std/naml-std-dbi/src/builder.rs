///
/// Query building: lexical placeholder substitution.
///
/// - Array params: each `?` takes the next element; once the array runs
///   out, remaining `?` are left in place
/// - Object params: `:name` (a letter, then letters, digits, `_`) is
///   replaced by the named property, `NULL` when missing
/// - Anything else: the template is returned as-is
///
/// The scan is purely lexical. A `?` or `:word` inside a quoted SQL
/// string in the template is substituted like any other.
///

use naml_std_core::Value;

use crate::encoder::encode_into;

/// Longest placeholder name used for lookup; longer names are truncated
pub const MAX_PARAM_NAME_LEN: usize = 63;

pub fn build_query(template: &str, params: &Value) -> String {
    match params {
        Value::Array(items) => bind_positional(template, items),
        p if p.is_object() => bind_named(template, p),
        _ => template.to_string(),
    }
}

fn bind_positional(template: &str, items: &[Value]) -> String {
    let mut out = String::with_capacity(template.len() + items.len() * 8);
    let mut values = items.iter();
    let mut run_start = 0;

    for (pos, _) in template.match_indices('?') {
        let Some(value) = values.next() else {
            break;
        };
        out.push_str(&template[run_start..pos]);
        encode_into(value, &mut out);
        run_start = pos + 1;
    }
    out.push_str(&template[run_start..]);
    out
}

fn bind_named(template: &str, params: &Value) -> String {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut run_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let starts_name =
            bytes[i] == b':' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic);
        if !starts_name {
            i += 1;
            continue;
        }

        out.push_str(&template[run_start..i]);
        let name_start = i + 1;
        let mut name_end = name_start;
        while bytes
            .get(name_end)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_')
        {
            name_end += 1;
        }
        // ASCII-only, so any byte cut is a char boundary
        let lookup_end = name_end.min(name_start + MAX_PARAM_NAME_LEN);
        encode_into(params.property(&template[name_start..lookup_end]), &mut out);

        i = name_end;
        run_start = name_end;
    }
    out.push_str(&template[run_start..]);
    out
}
