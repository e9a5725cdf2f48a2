/* src/page/format/rust/src/ast.rs */

use serde_json::Value;

#[derive(Debug)]
pub(crate) enum Segment {
  Text(String),
  Expr(Expr),
  // Malformed marker; renders as the empty string
  Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathKey {
  Key(String),
  Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
  Eq,
  Ne,
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
  Literal(Value),
  Path(Vec<PathKey>),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  Compare { op: CompareOp, lhs: Box<Expr>, rhs: Box<Expr> },
  Cond { value: Box<Expr>, test: Box<Expr>, otherwise: Option<Box<Expr>> },
  Filter { input: Box<Expr>, name: String, args: Vec<Value> },
}
