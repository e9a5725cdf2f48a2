/* src/page/format/rust/src/helpers.rs */

use serde_json::Value;

use crate::ast::PathKey;

pub(crate) fn resolve<'a>(keys: &[PathKey], data: &'a Value) -> Option<&'a Value> {
  let mut current = data;
  for key in keys {
    current = match key {
      PathKey::Key(name) => match current {
        Value::Array(items) => items.get(name.parse::<usize>().ok()?)?,
        other => other.get(name)?,
      },
      PathKey::Index(index) => match current {
        Value::Object(map) => map.get(&index.to_string())?,
        other => other.get(*index)?,
      },
    };
  }
  Some(current)
}

/// Truthiness used by `not`, `and`, `or` and conditionals.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        i != 0
      } else if let Some(f) = n.as_f64() {
        f != 0.0
      } else {
        true
      }
    }
    Value::String(s) => !s.is_empty(),
    Value::Array(arr) => !arr.is_empty(),
    Value::Object(map) => !map.is_empty(),
  }
}

/// Render a value the way it is substituted into a template.
pub fn stringify(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

const TRUTHY_STRINGS: &[&str] = &["true", "yes", "y", "on", "1"];

/// Coerce a value to a boolean using the canonical truthy set.
///
/// `true`, non-zero numbers and the strings `true`, `yes`, `y`, `on`, `1`
/// (case-insensitive, surrounding whitespace ignored) are `true`. Everything
/// else, including `null`, is `false`.
pub fn to_boolean(value: &Value) -> bool {
  match value {
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => {
      let s = s.trim().to_ascii_lowercase();
      TRUTHY_STRINGS.contains(&s.as_str())
    }
    _ => false,
  }
}

/// Equality that treats `1` and `1.0` as the same number.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
      (Some(x), Some(y)) => x == y,
      _ => x == y,
    },
    _ => a == b,
  }
}
