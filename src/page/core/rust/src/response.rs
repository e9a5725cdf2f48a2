/* src/page/core/rust/src/response.rs */

use formwork_format::format_deep;
use serde_json::{Map, Value};

use crate::config::FilterMode;

/// Remap a read response. Each key of `transform` is set to its template
/// formatted against the untouched response; other keys are kept.
pub fn transform(response: Value, transform: &Map<String, Value>) -> Value {
  let Value::Object(mut map) = response else {
    return response;
  };
  let source = Value::Object(map.clone());
  for (key, template) in transform {
    map.insert(key.clone(), format_deep(template, &source));
  }
  Value::Object(map)
}

/// Keep (`pick`) or drop (`omit`) the named top-level properties.
pub fn filter(response: Value, props: &[String], mode: FilterMode) -> Value {
  let Value::Object(map) = response else {
    return response;
  };
  let keep = |key: &String| props.contains(key) == (mode == FilterMode::Pick);
  Value::Object(map.into_iter().filter(|(k, _)| keep(k)).collect())
}
