//! Cut target and condition grammar.
//!
//! ```text
//! target    := IDENT | IDENT IDENT '[' INT ']'
//! condition := ('>=' | '<=' | '==' | '!=' | '<' | '>') NUMBER
//! ```
//!
//! Strings are tokenized once and parsed by recursive descent into
//! [`CutTarget`] and [`Condition`]. Binding against a directory happens in
//! [`Cut::initialize_from_str`](crate::Cut::initialize_from_str).

use cutflow_core::{CutflowError, Result};

use crate::relation::{Relation, Threshold};

/// What a cut reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutTarget {
    /// A scalar variable.
    Variable(String),
    /// `field` of element `index` of `container`.
    Element {
        container: String,
        field: String,
        index: usize,
    },
}

/// Relation and threshold of a cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub relation: Relation,
    /// `Int` unless the literal has a fraction or an exponent.
    pub threshold: Threshold,
}

/// Parses a cut target such as `N_Jets` or `Muon pt[0]`.
pub fn parse_target(input: &str) -> Result<CutTarget> {
    let mut parser = Parser::new(input)?;
    let target = parser.target()?;
    parser.finish()?;
    Ok(target)
}

/// Parses a cut condition such as `>=2` or `< 2.5`.
pub fn parse_condition(input: &str) -> Result<Condition> {
    let mut parser = Parser::new(input)?;
    let condition = parser.condition()?;
    parser.finish()?;
    Ok(condition)
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Number(String),
    Relation(Relation),
    LBracket,
    RBracket,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn error(input: &str, pos: usize, message: impl AsRef<str>) -> CutflowError {
    CutflowError::Parse(format!(
        "{} at position {} in '{}'",
        message.as_ref(),
        pos,
        input
    ))
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        let kind = match c {
            b' ' | b'\t' => {
                pos += 1;
                continue;
            }
            b'[' => {
                pos += 1;
                TokenKind::LBracket
            }
            b']' => {
                pos += 1;
                TokenKind::RBracket
            }
            b'>' | b'<' | b'=' | b'!' => {
                let inclusive = bytes.get(pos + 1) == Some(&b'=');
                let relation = match (c, inclusive) {
                    (b'>', true) => Relation::GreaterEqual,
                    (b'<', true) => Relation::LessEqual,
                    (b'=', true) => Relation::Equal,
                    (b'!', true) => Relation::NotEqual,
                    (b'>', false) => Relation::Greater,
                    (b'<', false) => Relation::Less,
                    _ => return Err(error(input, pos, format!("incomplete relation '{}'", c as char))),
                };
                pos += if inclusive { 2 } else { 1 };
                TokenKind::Relation(relation)
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                pos = scan_number(input, pos)?;
                TokenKind::Number(input[start..pos].to_string())
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'.')
                {
                    pos += 1;
                }
                TokenKind::Ident(input[start..pos].to_string())
            }
            _ => {
                let found = input[pos..].chars().next().unwrap_or('?');
                return Err(error(input, pos, format!("unexpected character '{}'", found)));
            }
        };
        tokens.push(Token { kind, pos: start });
    }
    Ok(tokens)
}

/// Returns the end of the number literal starting at `start`.
fn scan_number(input: &str, start: usize) -> Result<usize> {
    let bytes = input.as_bytes();
    let digits = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };

    let mut pos = start;
    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_end = digits(pos);
    let mut mantissa_digits = int_end - pos;
    pos = int_end;
    if bytes.get(pos) == Some(&b'.') {
        let frac_end = digits(pos + 1);
        mantissa_digits += frac_end - pos - 1;
        pos = frac_end;
    }
    if mantissa_digits == 0 {
        return Err(error(input, start, "expected a number"));
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end == exp {
            return Err(error(input, pos, "malformed exponent"));
        }
        pos = exp_end;
    }
    Ok(pos)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    next: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            next: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.input.len())
    }

    fn error(&self, message: impl AsRef<str>) -> CutflowError {
        error(self.input, self.position(), message)
    }

    fn ident(&mut self) -> Result<String> {
        if let Some(Token {
            kind: TokenKind::Ident(name),
            ..
        }) = self.peek()
        {
            let name = name.clone();
            self.next += 1;
            return Ok(name);
        }
        Err(self.error("expected an identifier"))
    }

    fn number(&mut self) -> Result<(String, usize)> {
        if let Some(Token {
            kind: TokenKind::Number(text),
            pos,
        }) = self.peek()
        {
            let found = (text.clone(), *pos);
            self.next += 1;
            return Ok(found);
        }
        Err(self.error("expected a number"))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        if self.peek().map(|t| &t.kind) == Some(&kind) {
            self.next += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", what)))
        }
    }

    fn finish(&self) -> Result<()> {
        if self.peek().is_some() {
            Err(self.error("unexpected trailing input"))
        } else {
            Ok(())
        }
    }

    fn target(&mut self) -> Result<CutTarget> {
        let name = self.ident()?;
        if self.peek().is_none() {
            return Ok(CutTarget::Variable(name));
        }
        let field = self.ident()?;
        self.expect(TokenKind::LBracket, "[")?;
        let (text, pos) = self.number()?;
        let index = text
            .parse::<usize>()
            .map_err(|_| error(self.input, pos, format!("'{}' is not an element index", text)))?;
        self.expect(TokenKind::RBracket, "]")?;
        Ok(CutTarget::Element {
            container: name,
            field,
            index,
        })
    }

    fn condition(&mut self) -> Result<Condition> {
        let relation = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Relation(relation)) => *relation,
            _ => return Err(self.error("expected one of >=, <=, ==, !=, <, >")),
        };
        self.next += 1;
        let (text, pos) = self.number()?;
        let threshold = if text.contains(|c| matches!(c, '.' | 'e' | 'E')) {
            text.parse::<f64>().map(Threshold::Float).ok()
        } else {
            text.parse::<i64>().map(Threshold::Int).ok()
        };
        let threshold =
            threshold.ok_or_else(|| error(self.input, pos, format!("'{}' is out of range", text)))?;
        Ok(Condition {
            relation,
            threshold,
        })
    }
}
