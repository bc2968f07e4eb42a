//! Rendering of query arguments for log records and span labels.

use sea_orm::Value;

/// Render arguments as a bracketed list, e.g. `[1, "bob", NULL]`.
///
/// Byte strings are rendered by length only.
pub fn render_args(args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(render_value).collect();
    format!("[{}]", rendered.join(", "))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Bool(Some(v)) => v.to_string(),
        Value::TinyInt(Some(v)) => v.to_string(),
        Value::SmallInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::TinyUnsigned(Some(v)) => v.to_string(),
        Value::SmallUnsigned(Some(v)) => v.to_string(),
        Value::Unsigned(Some(v)) => v.to_string(),
        Value::BigUnsigned(Some(v)) => v.to_string(),
        Value::Float(Some(v)) => v.to_string(),
        Value::Double(Some(v)) => v.to_string(),
        Value::Char(Some(v)) => format!("{v:?}"),
        Value::String(Some(v)) => format!("{v:?}"),
        Value::Bytes(Some(v)) => format!("<{} bytes>", v.len()),
        Value::Bool(None)
        | Value::TinyInt(None)
        | Value::SmallInt(None)
        | Value::Int(None)
        | Value::BigInt(None)
        | Value::TinyUnsigned(None)
        | Value::SmallUnsigned(None)
        | Value::Unsigned(None)
        | Value::BigUnsigned(None)
        | Value::Float(None)
        | Value::Double(None)
        | Value::Char(None)
        | Value::String(None)
        | Value::Bytes(None) => "NULL".to_string(),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}
