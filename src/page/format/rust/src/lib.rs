/* src/page/format/rust/src/lib.rs */

//! Token formatter for page configurations.
//!
//! Strings may embed `{{ expression }}` markers that are resolved against a
//! JSON context. Expressions are a small Jinja subset: dotted/bracket paths,
//! literals, `==`/`!=`, `not`/`and`/`or`, `x if cond else y` and `| filter`
//! post-processors. A path that does not exist resolves to `null` and is
//! substituted as the empty string; a marker that fails to compile also
//! renders empty. Formatting never fails.

mod ast;
mod cache;
mod filters;
mod helpers;
mod parser;
mod render;
mod token;

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::ast::PathKey;

pub use helpers::{is_truthy, loose_eq, stringify, to_boolean};
pub use parser::{DiagnosticKind, ParseDiagnostic};

fn marker_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("marker pattern is valid"))
}

/// Substitute every marker in `template` against `context`.
pub fn format(template: &str, context: &Value) -> String {
  if !template.contains(token::MARKER_OPEN) {
    return template.to_string();
  }
  let compiled = cache::compile(template);
  render::render(&compiled.segments, context)
}

/// Like `format` but also returns the diagnostics of markers that could not
/// be compiled.
pub fn format_with_diagnostics(template: &str, context: &Value) -> (String, Vec<ParseDiagnostic>) {
  let compiled = cache::compile(template);
  (render::render(&compiled.segments, context), compiled.diagnostics.clone())
}

/// Apply `format` to every string leaf of `value`. Object keys and
/// non-string leaves are left untouched.
pub fn format_deep(value: &Value, context: &Value) -> Value {
  match value {
    Value::String(s) => Value::String(format(s, context)),
    Value::Array(items) => Value::Array(items.iter().map(|v| format_deep(v, context)).collect()),
    Value::Object(map) => {
      Value::Object(map.iter().map(|(k, v)| (k.clone(), format_deep(v, context))).collect())
    }
    other => other.clone(),
  }
}

/// Whether `value` contains at least one marker in any string leaf.
pub fn is_formatable(value: &Value) -> bool {
  match value {
    Value::String(s) => marker_re().is_match(s),
    Value::Array(items) => items.iter().any(is_formatable),
    Value::Object(map) => map.values().any(is_formatable),
    _ => false,
  }
}

/// Look up a dotted/bracket path (`data.editing`, `rows[0].name`) in `data`.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
  let keys = parser::parse_path(path)?;
  helpers::resolve(&keys, data)
}

/// `lookup` rooted at a map, so a value bag can be searched without wrapping it.
pub fn lookup_in<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
  let keys = parser::parse_path(path)?;
  let (first, rest) = keys.split_first()?;
  let root = match first {
    PathKey::Key(name) => map.get(name)?,
    PathKey::Index(_) => return None,
  };
  helpers::resolve(rest, root)
}

#[cfg(test)]
mod tests;
