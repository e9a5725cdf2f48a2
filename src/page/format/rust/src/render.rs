/* src/page/format/rust/src/render.rs */

use serde_json::Value;

use crate::ast::{CompareOp, Expr, Segment};
use crate::filters;
use crate::helpers::{is_truthy, loose_eq, resolve, stringify};

pub(crate) fn render(segments: &[Segment], context: &Value) -> String {
  let mut out = String::new();

  for segment in segments {
    match segment {
      Segment::Text(value) => out.push_str(value),
      Segment::Expr(expr) => out.push_str(&stringify(&eval(expr, context))),
      Segment::Invalid => {}
    }
  }

  out
}

pub(crate) fn eval(expr: &Expr, context: &Value) -> Value {
  match expr {
    Expr::Literal(value) => value.clone(),
    Expr::Path(keys) => resolve(keys, context).cloned().unwrap_or(Value::Null),
    Expr::Not(inner) => Value::Bool(!is_truthy(&eval(inner, context))),
    // `and` / `or` yield the deciding operand, not a coerced boolean
    Expr::And(lhs, rhs) => {
      let left = eval(lhs, context);
      if is_truthy(&left) { eval(rhs, context) } else { left }
    }
    Expr::Or(lhs, rhs) => {
      let left = eval(lhs, context);
      if is_truthy(&left) { left } else { eval(rhs, context) }
    }
    Expr::Compare { op, lhs, rhs } => {
      let equal = loose_eq(&eval(lhs, context), &eval(rhs, context));
      Value::Bool(match op {
        CompareOp::Eq => equal,
        CompareOp::Ne => !equal,
      })
    }
    Expr::Cond { value, test, otherwise } => {
      if is_truthy(&eval(test, context)) {
        eval(value, context)
      } else {
        otherwise.as_ref().map_or(Value::Null, |e| eval(e, context))
      }
    }
    Expr::Filter { input, name, args } => filters::apply(name, eval(input, context), args),
  }
}
