/* src/page/core/rust/src/constraint.rs */

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use formwork_format::{is_truthy, lookup_in, loose_eq, to_boolean};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::config::FormValues;

/// Boolean expression tree over the value bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
  pub operator: Operator,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arg0: Option<Arg>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arg1: Option<Arg>,
}

impl Constraint {
  pub fn unary(operator: Operator, arg0: Arg) -> Self {
    Self { operator, arg0: Some(arg0), arg1: None }
  }

  pub fn binary(operator: Operator, arg0: Arg, arg1: Arg) -> Self {
    Self { operator, arg0: Some(arg0), arg1: Some(arg1) }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
  /// Reference to a value bag entry; dotted paths reach into nested values.
  Prop { prop: String },
  Constraint(Box<Constraint>),
  Literal(Value),
}

impl Arg {
  pub fn prop(name: impl Into<String>) -> Self {
    Self::Prop { prop: name.into() }
  }

  pub fn literal(value: impl Into<Value>) -> Self {
    Self::Literal(value.into())
  }
}

impl From<Constraint> for Arg {
  fn from(c: Constraint) -> Self {
    Self::Constraint(Box::new(c))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
  #[serde(rename = "and", alias = "&&")]
  And,
  #[serde(rename = "or", alias = "||")]
  Or,
  #[serde(rename = "not", alias = "!")]
  Not,
  #[serde(rename = "eq", alias = "==", alias = "equal")]
  Eq,
  #[serde(rename = "ne", alias = "!=", alias = "notEqual")]
  Ne,
  #[serde(rename = "lt", alias = "<")]
  Lt,
  #[serde(rename = "le", alias = "<=")]
  Le,
  #[serde(rename = "gt", alias = ">")]
  Gt,
  #[serde(rename = "ge", alias = ">=")]
  Ge,
  #[serde(rename = "z")]
  Empty,
  #[serde(rename = "n")]
  NotEmpty,
  #[serde(rename = "truthy")]
  Truthy,
  #[serde(rename = "falsy")]
  Falsy,
  #[serde(rename = "in")]
  In,
  #[serde(rename = "notIn")]
  NotIn,
  #[serde(rename = "startsWith")]
  StartsWith,
  #[serde(rename = "endsWith")]
  EndsWith,
  #[serde(rename = "includes")]
  Includes,
  #[serde(rename = "regexp")]
  Regexp,
}

#[derive(Debug, Error)]
enum EvalError {
  #[error("operator {0:?} is missing arg0")]
  MissingArg0(Operator),
  #[error("operator {0:?} is missing arg1")]
  MissingArg1(Operator),
  #[error("invalid pattern {pattern:?}: {source}")]
  Pattern { pattern: String, source: regex::Error },
}

/// Evaluate `constraint` against `values`.
///
/// Never fails: a malformed tree is logged and evaluates to `false`.
pub fn test(constraint: &Constraint, values: &FormValues) -> bool {
  match eval(constraint, values) {
    Ok(result) => result,
    Err(e) => {
      warn!(error = %e, "constraint evaluation failed, treating as false");
      false
    }
  }
}

fn eval(c: &Constraint, values: &FormValues) -> Result<bool, EvalError> {
  let op = c.operator;
  let arg0 = || c.arg0.as_ref().ok_or(EvalError::MissingArg0(op));
  let arg1 = || c.arg1.as_ref().ok_or(EvalError::MissingArg1(op));

  Ok(match op {
    Operator::And => eval_bool(arg0()?, values)? && eval_bool(arg1()?, values)?,
    Operator::Or => eval_bool(arg0()?, values)? || eval_bool(arg1()?, values)?,
    Operator::Not => !eval_bool(arg0()?, values)?,
    Operator::Eq => loose_eq(&operand(arg0()?, values)?, &operand(arg1()?, values)?),
    Operator::Ne => !loose_eq(&operand(arg0()?, values)?, &operand(arg1()?, values)?),
    Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
      let ordering = compare(&operand(arg0()?, values)?, &operand(arg1()?, values)?);
      match (op, ordering) {
        (_, None) => false,
        (Operator::Lt, Some(o)) => o == Ordering::Less,
        (Operator::Le, Some(o)) => o != Ordering::Greater,
        (Operator::Gt, Some(o)) => o == Ordering::Greater,
        (_, Some(o)) => o != Ordering::Less,
      }
    }
    Operator::Empty => is_empty(&operand(arg0()?, values)?),
    Operator::NotEmpty => !is_empty(&operand(arg0()?, values)?),
    Operator::Truthy => to_boolean(&operand(arg0()?, values)?),
    Operator::Falsy => !to_boolean(&operand(arg0()?, values)?),
    Operator::In => contains(&operand(arg1()?, values)?, &operand(arg0()?, values)?),
    Operator::NotIn => !contains(&operand(arg1()?, values)?, &operand(arg0()?, values)?),
    Operator::Includes => contains(&operand(arg0()?, values)?, &operand(arg1()?, values)?),
    Operator::StartsWith => match (operand(arg0()?, values)?, operand(arg1()?, values)?) {
      (Value::String(s), Value::String(p)) => s.starts_with(&p),
      _ => false,
    },
    Operator::EndsWith => match (operand(arg0()?, values)?, operand(arg1()?, values)?) {
      (Value::String(s), Value::String(p)) => s.ends_with(&p),
      _ => false,
    },
    Operator::Regexp => {
      let source = arg1()?;
      match (operand(arg0()?, values)?, operand(source, values)?) {
        (Value::String(s), Value::String(pattern)) => match source {
          Arg::Literal(_) => cached_pattern_matches(&pattern, &s)?,
          _ => compile(&pattern)?.is_match(&s),
        },
        _ => false,
      }
    }
  })
}

fn eval_bool(arg: &Arg, values: &FormValues) -> Result<bool, EvalError> {
  match arg {
    Arg::Constraint(c) => eval(c, values),
    other => Ok(is_truthy(&operand(other, values)?)),
  }
}

fn operand(arg: &Arg, values: &FormValues) -> Result<Value, EvalError> {
  Ok(match arg {
    Arg::Prop { prop } => values
      .get(prop)
      .or_else(|| lookup_in(values, prop))
      .cloned()
      .unwrap_or(Value::Null),
    Arg::Constraint(c) => Value::Bool(eval(c, values)?),
    Arg::Literal(v) => v.clone(),
  })
}

fn is_empty(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.is_empty(),
    Value::Array(items) => items.is_empty(),
    Value::Object(map) => map.is_empty(),
    _ => false,
  }
}

fn as_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
  match (as_number(a), as_number(b)) {
    (Some(x), Some(y)) => x.partial_cmp(&y),
    _ => match (a, b) {
      (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
      _ => None,
    },
  }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
  match (haystack, needle) {
    (Value::Array(items), needle) => items.iter().any(|item| loose_eq(item, needle)),
    (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
    _ => false,
  }
}

fn compile(pattern: &str) -> Result<Regex, EvalError> {
  Regex::new(pattern).map_err(|source| EvalError::Pattern { pattern: pattern.to_string(), source })
}

fn pattern_cache() -> MutexGuard<'static, HashMap<String, Regex>> {
  static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
  PATTERNS.get_or_init(Default::default).lock().unwrap_or_else(PoisonError::into_inner)
}

/// Patterns written in page configuration are finite; only those are kept.
fn cached_pattern_matches(pattern: &str, input: &str) -> Result<bool, EvalError> {
  let mut cache = pattern_cache();
  if let Some(re) = cache.get(pattern) {
    return Ok(re.is_match(input));
  }
  let re = compile(pattern)?;
  let matched = re.is_match(input);
  cache.insert(pattern.to_string(), re);
  Ok(matched)
}
