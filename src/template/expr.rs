//! Platform expressions inside block tags: `claude`, `claude|cursor`,
//! `!opencode`, `claude&!cursor`.
//!
//! `Or := And ('|' And)*`, `And := Unary ('&' Unary)*`,
//! `Unary := '!' Unary | platform-id`.

use std::fmt;

use crate::core::Platform;
use crate::utils::suggest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformExpr {
    Platform(Platform),
    Not(Box<PlatformExpr>),
    And(Box<PlatformExpr>, Box<PlatformExpr>),
    Or(Box<PlatformExpr>, Box<PlatformExpr>),
}

/// A malformed platform expression; `offset` is a byte offset into the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl PlatformExpr {
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let mut parser = ExprParser {
            input,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        parser.skip_whitespace();
        if parser.pos < input.len() {
            return Err(parser.error(format!("unexpected '{}'", &input[parser.pos..])));
        }
        Ok(expr)
    }

    /// Whether `input` is written as a platform expression: operators and
    /// words that are platform ids or near misses of one.
    ///
    /// Other heads (`each items`, `if user`) belong to template languages the
    /// body is documenting and are left alone.
    pub fn is_platform_shaped(input: &str) -> bool {
        if input.chars().any(|c| !(is_word_char(c) || matches!(c, '|' | '&' | '!') || c.is_whitespace())) {
            return false;
        }
        let mut words = input.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty()).peekable();
        words.peek().is_some()
            && words.all(|word| {
                let normalized = word.to_ascii_lowercase();
                Platform::from_id(&normalized).is_some() || suggest(&normalized, Platform::ids()).is_some()
            })
    }

    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PlatformExpr::Platform(p) => *p == platform,
            PlatformExpr::Not(inner) => !inner.matches(platform),
            PlatformExpr::And(left, right) => left.matches(platform) && right.matches(platform),
            PlatformExpr::Or(left, right) => left.matches(platform) || right.matches(platform),
        }
    }
}

impl fmt::Display for PlatformExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformExpr::Platform(p) => write!(f, "{p}"),
            PlatformExpr::Not(inner) => write!(f, "!{inner}"),
            PlatformExpr::And(left, right) => write!(f, "({left}&{right})"),
            PlatformExpr::Or(left, right) => write!(f, "({left}|{right})"),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.input[self.pos..].chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<PlatformExpr, ExprError> {
        let mut left = self.parse_and()?;
        while self.eat('|') {
            let right = self.parse_and()?;
            left = PlatformExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<PlatformExpr, ExprError> {
        let mut left = self.parse_unary()?;
        while self.eat('&') {
            let right = self.parse_unary()?;
            left = PlatformExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<PlatformExpr, ExprError> {
        if self.eat('!') {
            return Ok(PlatformExpr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_platform()
    }

    fn parse_platform(&mut self) -> Result<PlatformExpr, ExprError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
        if len == 0 {
            return Err(match rest.chars().next() {
                Some(c) => self.error(format!("expected a platform name, found '{c}'")),
                None => self.error("expected a platform name"),
            });
        }

        let word = &rest[..len];
        let normalized = word.to_ascii_lowercase();
        let Some(platform) = Platform::from_id(&normalized) else {
            let hint = suggest(&normalized, Platform::ids())
                .map(|s| format!(" (did you mean '{s}'?)"))
                .unwrap_or_default();
            return Err(self.error(format!("unknown platform '{word}'{hint}")));
        };
        self.pos += len;
        Ok(PlatformExpr::Platform(platform))
    }
}
