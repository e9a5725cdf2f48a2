/* src/page/format/rust/src/cache.rs */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::warn;

use crate::ast::Segment;
use crate::parser::{ParseDiagnostic, parse_with_diagnostics};
use crate::token::tokenize;

/// A template compiled once and shared by every later render.
#[derive(Debug)]
pub(crate) struct Template {
  pub(crate) segments: Vec<Segment>,
  pub(crate) diagnostics: Vec<ParseDiagnostic>,
}

fn templates() -> &'static Mutex<HashMap<String, Arc<Template>>> {
  static CACHE: OnceLock<Mutex<HashMap<String, Arc<Template>>>> = OnceLock::new();
  CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

pub(crate) fn compile(source: &str) -> Arc<Template> {
  let mut cache = templates().lock().unwrap_or_else(PoisonError::into_inner);
  if let Some(template) = cache.get(source) {
    return Arc::clone(template);
  }

  let mut diagnostics = Vec::new();
  let segments = parse_with_diagnostics(tokenize(source), &mut diagnostics);
  for d in &diagnostics {
    warn!(expression = %d.expression, kind = ?d.kind, "unresolvable token: {}", d.message);
  }
  let template = Arc::new(Template { segments, diagnostics });
  cache.insert(source.to_string(), Arc::clone(&template));
  template
}
