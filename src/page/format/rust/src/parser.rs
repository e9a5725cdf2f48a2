/* src/page/format/rust/src/parser.rs */

use serde_json::Value;

use crate::ast::{CompareOp, Expr, PathKey, Segment};
use crate::filters::is_known_filter;
use crate::token::{Lexeme, Token, lex};

/// Diagnostic emitted for a marker whose expression could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
  pub kind: DiagnosticKind,
  /// Raw marker source, without the surrounding braces.
  pub expression: String,
  pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  /// Syntax error inside a `{{ ... }}` marker
  MalformedExpression,
  /// Filter name not known to the formatter
  UnknownFilter,
}

struct Failure {
  kind: DiagnosticKind,
  message: String,
}

impl Failure {
  fn malformed(message: impl Into<String>) -> Self {
    Self { kind: DiagnosticKind::MalformedExpression, message: message.into() }
  }
}

pub(crate) fn parse_with_diagnostics(
  tokens: Vec<Token>,
  diagnostics: &mut Vec<ParseDiagnostic>,
) -> Vec<Segment> {
  tokens
    .into_iter()
    .map(|token| match token {
      Token::Text(text) => Segment::Text(text),
      Token::Marker(source) => match parse_expression(&source) {
        Ok(expr) => Segment::Expr(expr),
        Err(failure) => {
          diagnostics.push(ParseDiagnostic {
            kind: failure.kind,
            expression: source.trim().to_string(),
            message: failure.message,
          });
          Segment::Invalid
        }
      },
    })
    .collect()
}

fn parse_expression(source: &str) -> Result<Expr, Failure> {
  let lexemes = lex(source).map_err(Failure::malformed)?;
  if lexemes.is_empty() {
    return Err(Failure::malformed("empty expression"));
  }
  let mut parser = Parser { lexemes, pos: 0 };
  let expr = parser.expr()?;
  if let Some(extra) = parser.peek() {
    return Err(Failure::malformed(format!("unexpected trailing input {extra:?}")));
  }
  Ok(expr)
}

/// Parse a bare dotted/bracket path (`a.b[0]["c"]`). Returns `None` when the
/// string is not a plain path.
pub(crate) fn parse_path(source: &str) -> Option<Vec<PathKey>> {
  let lexemes = lex(source).ok()?;
  let mut parser = Parser { lexemes, pos: 0 };
  match parser.next()? {
    Lexeme::Ident(name) if !is_keyword(&name) => {
      let keys = parser.path_tail(name).ok()?;
      parser.peek().is_none().then_some(keys)
    }
    _ => None,
  }
}

const KEYWORDS: &[&str] = &["if", "else", "and", "or", "not"];

fn is_keyword(ident: &str) -> bool {
  KEYWORDS.contains(&ident)
}

struct Parser {
  lexemes: Vec<Lexeme>,
  pos: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Lexeme> {
    self.lexemes.get(self.pos)
  }

  fn next(&mut self) -> Option<Lexeme> {
    let lexeme = self.lexemes.get(self.pos).cloned();
    if lexeme.is_some() {
      self.pos += 1;
    }
    lexeme
  }

  fn eat(&mut self, expected: &Lexeme) -> bool {
    if self.peek() == Some(expected) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn eat_keyword(&mut self, keyword: &str) -> bool {
    if matches!(self.peek(), Some(Lexeme::Ident(name)) if name == keyword) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, expected: &Lexeme) -> Result<(), Failure> {
    if self.eat(expected) {
      Ok(())
    } else {
      Err(Failure::malformed(format!("expected {expected:?}, found {:?}", self.peek())))
    }
  }

  fn expr(&mut self) -> Result<Expr, Failure> {
    let value = self.or_expr()?;
    if self.eat_keyword("if") {
      let test = self.or_expr()?;
      let otherwise = if self.eat_keyword("else") { Some(Box::new(self.expr()?)) } else { None };
      return Ok(Expr::Cond { value: Box::new(value), test: Box::new(test), otherwise });
    }
    Ok(value)
  }

  fn or_expr(&mut self) -> Result<Expr, Failure> {
    let mut lhs = self.and_expr()?;
    while self.eat_keyword("or") {
      let rhs = self.and_expr()?;
      lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
  }

  fn and_expr(&mut self) -> Result<Expr, Failure> {
    let mut lhs = self.not_expr()?;
    while self.eat_keyword("and") {
      let rhs = self.not_expr()?;
      lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
  }

  fn not_expr(&mut self) -> Result<Expr, Failure> {
    if self.eat_keyword("not") {
      return Ok(Expr::Not(Box::new(self.not_expr()?)));
    }
    self.compare()
  }

  fn compare(&mut self) -> Result<Expr, Failure> {
    let lhs = self.postfix()?;
    let op = if self.eat(&Lexeme::EqEq) {
      CompareOp::Eq
    } else if self.eat(&Lexeme::NotEq) {
      CompareOp::Ne
    } else {
      return Ok(lhs);
    };
    let rhs = self.postfix()?;
    Ok(Expr::Compare { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
  }

  fn postfix(&mut self) -> Result<Expr, Failure> {
    let mut expr = self.primary()?;
    while self.eat(&Lexeme::Pipe) {
      let name = match self.next() {
        Some(Lexeme::Ident(name)) => name,
        other => return Err(Failure::malformed(format!("expected filter name, found {other:?}"))),
      };
      if !is_known_filter(&name) {
        return Err(Failure {
          kind: DiagnosticKind::UnknownFilter,
          message: format!("unknown filter '{name}'"),
        });
      }
      let args = if self.eat(&Lexeme::LParen) { self.literal_list()? } else { Vec::new() };
      expr = Expr::Filter { input: Box::new(expr), name, args };
    }
    Ok(expr)
  }

  fn literal_list(&mut self) -> Result<Vec<Value>, Failure> {
    let mut args = Vec::new();
    if self.eat(&Lexeme::RParen) {
      return Ok(args);
    }
    loop {
      match self.primary()? {
        Expr::Literal(value) => args.push(value),
        _ => return Err(Failure::malformed("filter arguments must be literals")),
      }
      if self.eat(&Lexeme::RParen) {
        return Ok(args);
      }
      self.expect(&Lexeme::Comma)?;
    }
  }

  fn primary(&mut self) -> Result<Expr, Failure> {
    match self.next() {
      Some(Lexeme::Str(s)) => Ok(Expr::Literal(Value::String(s))),
      Some(Lexeme::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
      Some(Lexeme::LParen) => {
        let inner = self.expr()?;
        self.expect(&Lexeme::RParen)?;
        Ok(inner)
      }
      Some(Lexeme::Ident(name)) => match name.as_str() {
        "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
        "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
        "none" | "None" | "null" => Ok(Expr::Literal(Value::Null)),
        kw if is_keyword(kw) => Err(Failure::malformed(format!("unexpected keyword '{kw}'"))),
        _ => Ok(Expr::Path(self.path_tail(name)?)),
      },
      other => Err(Failure::malformed(format!("unexpected {other:?}"))),
    }
  }

  fn path_tail(&mut self, head: String) -> Result<Vec<PathKey>, Failure> {
    let mut keys = vec![PathKey::Key(head)];
    loop {
      if self.eat(&Lexeme::Dot) {
        match self.next() {
          Some(Lexeme::Ident(name)) => keys.push(PathKey::Key(name)),
          Some(Lexeme::Number(n)) => keys.push(index_key(&n)),
          other => return Err(Failure::malformed(format!("expected property, found {other:?}"))),
        }
      } else if self.eat(&Lexeme::LBracket) {
        match self.next() {
          Some(Lexeme::Str(name)) => keys.push(PathKey::Key(name)),
          Some(Lexeme::Number(n)) => keys.push(index_key(&n)),
          other => return Err(Failure::malformed(format!("expected subscript, found {other:?}"))),
        }
        self.expect(&Lexeme::RBracket)?;
      } else {
        return Ok(keys);
      }
    }
  }
}

fn index_key(n: &serde_json::Number) -> PathKey {
  match n.as_u64().and_then(|i| usize::try_from(i).ok()) {
    Some(i) => PathKey::Index(i),
    None => PathKey::Key(n.to_string()),
  }
}
