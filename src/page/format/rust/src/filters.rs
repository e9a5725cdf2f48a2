/* src/page/format/rust/src/filters.rs */

use serde_json::Value;

use crate::helpers::{is_truthy, stringify, to_boolean};

const FILTERS: &[&str] = &[
  "default",
  "encodeuricomponent",
  "json",
  "length",
  "lower",
  "notavailable",
  "toboolean",
  "tostring",
  "trim",
  "upper",
];

pub(crate) fn is_known_filter(name: &str) -> bool {
  FILTERS.contains(&name)
}

// Filters are total: an input a filter cannot handle maps to a neutral value.
pub(crate) fn apply(name: &str, input: Value, args: &[Value]) -> Value {
  match name {
    "toboolean" => Value::Bool(to_boolean(&input)),
    "tostring" => Value::String(stringify(&input)),
    "upper" => Value::String(stringify(&input).to_uppercase()),
    "lower" => Value::String(stringify(&input).to_lowercase()),
    "trim" => Value::String(stringify(&input).trim().to_string()),
    "length" => {
      let len = match &input {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
      };
      Value::from(len)
    }
    "default" => {
      // default(value, boolean=false): with `true`, falsy inputs are replaced too
      let replace_falsy = args.get(1).is_some_and(is_truthy);
      if input.is_null() || (replace_falsy && !is_truthy(&input)) {
        args.first().cloned().unwrap_or(Value::Null)
      } else {
        input
      }
    }
    "json" => Value::String(input.to_string()),
    "encodeuricomponent" => Value::String(urlencoding::encode(&stringify(&input)).into_owned()),
    "notavailable" => {
      if stringify(&input).trim().is_empty() {
        Value::String("n/a".to_string())
      } else {
        input
      }
    }
    _ => Value::Null,
  }
}
