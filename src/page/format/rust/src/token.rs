/* src/page/format/rust/src/token.rs */

use serde_json::Number;

#[derive(Debug)]
pub(crate) enum Token {
  Text(String),
  Marker(String), // expression source (between {{ and }})
}

pub(crate) const MARKER_OPEN: &str = "{{";
pub(crate) const MARKER_CLOSE: &str = "}}";

pub(crate) fn tokenize(template: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut pos = 0;

  while pos < template.len() {
    if let Some(rel) = template[pos..].find(MARKER_OPEN) {
      let marker_start = pos + rel;
      if marker_start > pos {
        tokens.push(Token::Text(template[pos..marker_start].to_string()));
      }
      let after_open = marker_start + MARKER_OPEN.len();
      if let Some(close_rel) = template[after_open..].find(MARKER_CLOSE) {
        let source = template[after_open..after_open + close_rel].to_string();
        tokens.push(Token::Marker(source));
        pos = after_open + close_rel + MARKER_CLOSE.len();
      } else {
        // Unclosed marker -- treat rest as text
        tokens.push(Token::Text(template[marker_start..].to_string()));
        break;
      }
    } else {
      tokens.push(Token::Text(template[pos..].to_string()));
      break;
    }
  }

  tokens
}

/// Lexical unit of a marker expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lexeme {
  Ident(String),
  Str(String),
  Number(Number),
  Dot,
  Comma,
  Pipe,
  LParen,
  RParen,
  LBracket,
  RBracket,
  EqEq,
  NotEq,
}

pub(crate) fn lex(source: &str) -> Result<Vec<Lexeme>, String> {
  let chars: Vec<char> = source.chars().collect();
  let mut out = Vec::new();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    match c {
      c if c.is_whitespace() => i += 1,
      '.' => {
        out.push(Lexeme::Dot);
        i += 1;
      }
      ',' => {
        out.push(Lexeme::Comma);
        i += 1;
      }
      '|' => {
        out.push(Lexeme::Pipe);
        i += 1;
      }
      '(' => {
        out.push(Lexeme::LParen);
        i += 1;
      }
      ')' => {
        out.push(Lexeme::RParen);
        i += 1;
      }
      '[' => {
        out.push(Lexeme::LBracket);
        i += 1;
      }
      ']' => {
        out.push(Lexeme::RBracket);
        i += 1;
      }
      '=' if next == Some('=') => {
        out.push(Lexeme::EqEq);
        i += 2;
      }
      '!' if next == Some('=') => {
        out.push(Lexeme::NotEq);
        i += 2;
      }
      '"' | '\'' => {
        let (value, end) = lex_string(&chars, i)?;
        out.push(Lexeme::Str(value));
        i = end;
      }
      c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
        let (number, end) = lex_number(&chars, i)?;
        out.push(Lexeme::Number(number));
        i = end;
      }
      c if c.is_alphabetic() || c == '_' || c == '$' => {
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
          i += 1;
        }
        out.push(Lexeme::Ident(chars[start..i].iter().collect()));
      }
      other => return Err(format!("unexpected character '{other}'")),
    }
  }

  Ok(out)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
  let quote = chars[start];
  let mut value = String::new();
  let mut i = start + 1;
  while i < chars.len() {
    match chars[i] {
      '\\' => {
        let escaped = chars.get(i + 1).ok_or("unterminated escape sequence")?;
        value.push(match escaped {
          'n' => '\n',
          't' => '\t',
          other => *other,
        });
        i += 2;
      }
      c if c == quote => return Ok((value, i + 1)),
      c => {
        value.push(c);
        i += 1;
      }
    }
  }
  Err("unterminated string literal".to_string())
}

fn lex_number(chars: &[char], start: usize) -> Result<(Number, usize), String> {
  let mut i = start + 1;
  while i < chars.len() && chars[i].is_ascii_digit() {
    i += 1;
  }
  let mut is_float = false;
  if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
    is_float = true;
    i += 1;
    while i < chars.len() && chars[i].is_ascii_digit() {
      i += 1;
    }
  }
  let raw: String = chars[start..i].iter().collect();
  let number = if is_float {
    raw.parse::<f64>().ok().and_then(Number::from_f64)
  } else {
    raw.parse::<i64>().ok().map(Number::from)
  };
  number.map(|n| (n, i)).ok_or_else(|| format!("invalid number '{raw}'"))
}
