use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde::Serialize;

/// Array keys are either integers or strings; numeric strings normalise to integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    pub fn from_string(key: String) -> Self {
        match key.parse::<i64>() {
            Ok(int) if int.to_string() == key => ArrayKey::Int(int),
            _ => ArrayKey::Str(key),
        }
    }
}

/// Result of compiling a constant expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(IndexMap<ArrayKey, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    fn write_exported(&self, out: &mut String, indent: usize) -> fmt::Result {
        match self {
            Value::Null => out.push_str("NULL"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Int(value) => write!(out, "{value}")?,
            Value::Float(value) => out.push_str(&export_float(*value)),
            Value::String(value) => out.push_str(&export_string(value)),
            Value::Array(items) => {
                out.push_str("array (\n");
                let pad = " ".repeat(indent + 2);
                for (key, item) in items {
                    out.push_str(&pad);
                    match key {
                        ArrayKey::Int(key) => write!(out, "{key}")?,
                        ArrayKey::Str(key) => out.push_str(&export_string(key)),
                    }
                    out.push_str(" => ");
                    if matches!(item, Value::Array(_)) {
                        out.push('\n');
                        out.push_str(&pad);
                    }
                    item.write_exported(out, indent + 2)?;
                    out.push_str(",\n");
                }
                out.push_str(&" ".repeat(indent));
                out.push(')');
            }
        }
        Ok(())
    }
}

/// Renders the value the way `var_export()` prints it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_exported(&mut out, 0)?;
        f.write_str(&out)
    }
}

fn export_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

fn export_float(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }

    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = if mantissa.contains('.') {
                mantissa.to_string()
            } else {
                format!("{mantissa}.0")
            };
            let exponent = if exponent.starts_with('-') {
                exponent.to_string()
            } else {
                format!("+{exponent}")
            };
            format!("{mantissa}E{exponent}")
        }
        None => repr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_scalars() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(1e100).to_string(), "1.0E+100");
        assert_eq!(Value::String("it's".into()).to_string(), "'it\\'s'");
    }

    #[test]
    fn exports_nested_arrays() {
        let mut inner = IndexMap::new();
        inner.insert(ArrayKey::Int(0), Value::Int(1));
        let mut outer = IndexMap::new();
        outer.insert(ArrayKey::Str("a".into()), Value::Array(inner));
        outer.insert(ArrayKey::Int(3), Value::Null);

        assert_eq!(
            Value::Array(outer).to_string(),
            "array (\n  'a' => \n  array (\n    0 => 1,\n  ),\n  3 => NULL,\n)"
        );
    }

    #[test]
    fn numeric_string_keys_become_integers() {
        assert_eq!(ArrayKey::from_string("12".into()), ArrayKey::Int(12));
        assert_eq!(ArrayKey::from_string("012".into()), ArrayKey::Str("012".into()));
        assert_eq!(ArrayKey::from_string("-3".into()), ArrayKey::Int(-3));
    }
}
