//! Recursive-descent parser for `when:` expressions.
//!
//! ```text
//! Or      := And ('||' And)*
//! And     := Unary ('&&' Unary)*
//! Unary   := '!' Unary | Primary
//! Primary := '(' Or ')' | Atom
//! Atom    := namespace ':' key (CmpOp Literal)?
//! ```
//!
//! Nesting is capped at [`MAX_CONDITION_DEPTH`] and length at
//! [`MAX_CONDITION_TOKENS`], which together bound the depth of the tree.

use super::ConditionError;
use super::ast::{CmpOp, Expr, Fact, Literal, Namespace};
use super::lexer::{Token, TokenKind, tokenize};
use crate::constants::{MAX_CONDITION_DEPTH, MAX_CONDITION_TOKENS};

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse_expression(input: &str) -> Result<Expr, ConditionError> {
    let tokens = tokenize(input)?;
    if tokens.len() == 1 {
        return Err(ConditionError::parse("empty expression", 0));
    }
    if let Some(token) = tokens.get(MAX_CONDITION_TOKENS) {
        return Err(ConditionError::parse(
            format!("expression is longer than {MAX_CONDITION_TOKENS} tokens"),
            token.pos,
        ));
    }
    Parser::new(tokens).parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ConditionError> {
        let expr = self.parse_or()?;
        self.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        self.parse_binary_chain(TokenKind::OrOr, Self::parse_and, Expr::Or)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        self.parse_binary_chain(TokenKind::AndAnd, Self::parse_unary, Expr::And)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if self.match_kind(TokenKind::Bang) {
            self.enter()?;
            let inner = self.parse_unary();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
        if self.match_kind(TokenKind::LParen) {
            self.enter()?;
            let expr = self.parse_or();
            self.depth -= 1;
            let expr = expr?;
            self.expect(TokenKind::RParen)?;
            return Ok(expr);
        }
        self.parse_atom()
    }

    /// One level deeper, rejected past the nesting limit.
    fn enter(&mut self) -> Result<(), ConditionError> {
        if self.depth >= MAX_CONDITION_DEPTH {
            return Err(ConditionError::parse(
                format!("expression is nested more than {MAX_CONDITION_DEPTH} levels deep"),
                self.previous().pos,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_atom(&mut self) -> Result<Expr, ConditionError> {
        let token = self.advance();
        if token.kind != TokenKind::Word {
            return Err(unexpected("a fact such as 'npm:react'", &token));
        }

        let Some((namespace, key)) = token.lexeme.split_once(':') else {
            return Err(ConditionError::parse(
                format!("expected 'namespace:key', found '{}'", token.lexeme),
                token.pos,
            ));
        };
        if namespace.is_empty() {
            return Err(ConditionError::parse("missing namespace before ':'", token.pos));
        }

        let key = if key.is_empty() {
            // `file:"name with spaces"`
            let next = self.peek();
            if next.kind == TokenKind::String && next.pos == token.end {
                self.advance().lexeme
            } else {
                return Err(ConditionError::parse(
                    format!("missing key after '{namespace}:'"),
                    token.end,
                ));
            }
        } else {
            key.to_string()
        };

        let fact = Fact {
            namespace: Namespace::parse(namespace),
            key,
            pos: token.pos,
        };

        let Some(op) = self.match_comparison() else {
            return Ok(Expr::Fact(fact));
        };
        if !fact.namespace.is_scalar() {
            return Err(ConditionError::parse(
                format!(
                    "'{}' facts are true/false and cannot be compared; comparisons are only allowed for 'pkg:' and 'var:'",
                    fact.namespace
                ),
                self.previous().pos,
            ));
        }
        let value = self.parse_literal()?;
        Ok(Expr::Compare {
            fact,
            op,
            value,
        })
    }

    fn parse_literal(&mut self) -> Result<Literal, ConditionError> {
        let token = self.advance();
        match token.kind {
            TokenKind::String => Ok(Literal::String(token.lexeme)),
            TokenKind::Word => Ok(match token.lexeme.as_str() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                text => match text.parse::<f64>() {
                    Ok(value) if value.is_finite() => Literal::Number {
                        value,
                        text: text.to_string(),
                    },
                    _ => Literal::String(text.to_string()),
                },
            }),
            _ => Err(unexpected("a value to compare against", &token)),
        }
    }

    fn match_comparison(&mut self) -> Option<CmpOp> {
        let op = match self.peek().kind {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::Ne,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_binary_chain<G>(
        &mut self,
        operator: TokenKind,
        mut parse_operand: G,
        combine: fn(Box<Expr>, Box<Expr>) -> Expr,
    ) -> Result<Expr, ConditionError>
    where
        G: FnMut(&mut Self) -> Result<Expr, ConditionError>,
    {
        let mut node = parse_operand(self)?;
        while self.check(operator) {
            self.advance();
            let right = parse_operand(self)?;
            node = combine(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ConditionError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(kind.describe(), &token))
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.index.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }
}

fn unexpected(expected: &str, token: &Token) -> ConditionError {
    let found = match token.kind {
        TokenKind::Word | TokenKind::String => format!("'{}'", token.lexeme),
        kind => kind.describe().to_string(),
    };
    ConditionError::parse(format!("expected {expected}, found {found}"), token.pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ast::Ecosystem;

    #[test]
    fn test_precedence_and_binds_tighter() {
        let expr = parse_expression("npm:a || npm:b && !npm:c").unwrap();
        assert_eq!(expr.to_string(), "(npm:a || (npm:b && !npm:c))");
    }

    #[test]
    fn test_parentheses() {
        let expr = parse_expression("(npm:a || npm:b) && file:tsconfig.json").unwrap();
        assert_eq!(expr.to_string(), "((npm:a || npm:b) && file:tsconfig.json)");
    }

    #[test]
    fn test_comparison_literals() {
        let expr = parse_expression("pkg:type == \"module\"").unwrap();
        let Expr::Compare {
            fact,
            op,
            value,
        } = expr
        else {
            panic!("expected comparison");
        };
        assert_eq!(fact.namespace, Namespace::Pkg);
        assert_eq!(fact.key, "type");
        assert_eq!(op, CmpOp::Eq);
        assert_eq!(value, Literal::String("module".to_string()));

        let expr = parse_expression("var:strict == true").unwrap();
        assert!(matches!(expr, Expr::Compare { value: Literal::Bool(true), .. }));

        let expr = parse_expression("pkg:version >= 2.1.0").unwrap();
        assert!(matches!(expr, Expr::Compare { value: Literal::String(ref s), .. } if s == "2.1.0"));

        let expr = parse_expression("var:level > 3").unwrap();
        assert!(matches!(expr, Expr::Compare { value: Literal::Number { value, .. }, .. } if value == 3.0));
    }

    #[test]
    fn test_quoted_key() {
        let expr = parse_expression("file:\"docs/My Notes.md\"").unwrap();
        let Expr::Fact(fact) = expr else {
            panic!("expected fact");
        };
        assert_eq!(fact.namespace, Namespace::File);
        assert_eq!(fact.key, "docs/My Notes.md");
    }

    #[test]
    fn test_namespaces() {
        let expr = parse_expression("maven:org.junit:junit").unwrap();
        let Expr::Fact(fact) = expr else {
            panic!("expected fact");
        };
        assert_eq!(fact.namespace, Namespace::Dependency(Ecosystem::Maven));
        assert_eq!(fact.key, "org.junit:junit");

        let expr = parse_expression("yarn:react").unwrap();
        assert!(matches!(expr, Expr::Fact(Fact { namespace: Namespace::Unknown(_), .. })));
    }

    #[test]
    fn test_malformed_expressions_are_errors() {
        for input in [
            "",
            "npm:react &&",
            "&& npm:react",
            "npm:react npm:vue",
            "(npm:react",
            "npm:react)",
            "react",
            ":react",
            "npm:",
            "!",
            "pkg:type ==",
            "pkg:type == ==",
        ] {
            assert!(
                matches!(parse_expression(input), Err(ConditionError::Parse { .. })),
                "expected parse error for {input:?}"
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| format!("{}npm:a{}", "(".repeat(levels), ")".repeat(levels));
        assert!(parse_expression(&nested(MAX_CONDITION_DEPTH)).is_ok());

        let err = parse_expression(&nested(MAX_CONDITION_DEPTH + 1)).unwrap_err();
        assert!(err.to_string().contains("nested more than 128 levels"), "{err}");
        assert_eq!(err.offset(), Some(MAX_CONDITION_DEPTH));

        let err = parse_expression(&format!("{}npm:a", "!".repeat(300))).unwrap_err();
        assert!(err.to_string().contains("nested more than 128 levels"), "{err}");

        // Far past every limit: an error, not a stack overflow.
        let err = parse_expression(&"(".repeat(100_000)).unwrap_err();
        assert!(matches!(err, ConditionError::Parse { .. }));
    }

    #[test]
    fn test_length_limit() {
        let chain = vec!["npm:a"; 2000].join(" && ");
        let err = parse_expression(&chain).unwrap_err();
        assert!(err.to_string().contains("longer than 1024 tokens"), "{err}");

        let chain = vec!["npm:a"; 100].join(" || ");
        assert!(parse_expression(&chain).is_ok());
    }

    #[test]
    fn test_error_offsets() {
        let err = parse_expression("npm:react &&").unwrap_err();
        assert_eq!(err.offset(), Some(12));

        let err = parse_expression("npm:a npm:b").unwrap_err();
        assert_eq!(err.offset(), Some(6));
    }

    #[test]
    fn test_comparison_on_presence_namespace_is_error() {
        let err = parse_expression("npm:react == 18").unwrap_err();
        assert!(err.to_string().contains("cannot be compared"), "{err}");
        assert_eq!(err.offset(), Some(10));
    }
}
