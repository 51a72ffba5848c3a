//! Tokenizer for `when:` expressions.
//!
//! Positions are byte offsets into the source text.

use super::ConditionError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw text for words, decoded text for quoted strings.
    pub lexeme: String,
    pub pos: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare run of key characters: `npm:react`, `file:`, `42`, `module`.
    Word,
    /// A quoted string literal.
    String,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl TokenKind {
    pub const fn describe(self) -> &'static str {
        match self {
            TokenKind::Word => "a fact or value",
            TokenKind::String => "a string",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Eof => "end of expression",
        }
    }
}

/// Characters that end a bare word.
fn is_reserved(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '&' | '|' | '!' | '(' | ')' | '=' | '<' | '>' | '"' | '\'')
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '"' || ch == '\'' {
            tokens.push(consume_string(input, &mut chars)?);
            continue;
        }

        if !is_reserved(ch) {
            let mut end = pos;
            while let Some(&(idx, c)) = chars.peek() {
                if is_reserved(c) {
                    break;
                }
                end = idx + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Word,
                lexeme: input[pos..end].to_string(),
                pos,
                end,
            });
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, c)| c);
        let (kind, width) = match (ch, next) {
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('!', _) => (TokenKind::Bang, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('&', _) => return Err(ConditionError::parse("expected '&&', found a single '&'", pos)),
            ('|', _) => return Err(ConditionError::parse("expected '||', found a single '|'", pos)),
            ('=', _) => return Err(ConditionError::parse("expected '==', found a single '='", pos)),
            (other, _) => {
                return Err(ConditionError::parse(format!("unexpected character '{other}'"), pos));
            }
        };
        if width == 2 {
            chars.next();
        }
        tokens.push(Token {
            kind,
            lexeme: input[pos..pos + width].to_string(),
            pos,
            end: pos + width,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        pos: input.len(),
        end: input.len(),
    });

    Ok(tokens)
}

fn consume_string(
    input: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token, ConditionError> {
    let Some((start, quote)) = chars.next() else {
        return Err(ConditionError::parse("unterminated string", input.len()));
    };
    let mut out = String::new();

    while let Some((idx, current)) = chars.next() {
        if current == quote {
            return Ok(Token {
                kind: TokenKind::String,
                lexeme: out,
                pos: start,
                end: idx + current.len_utf8(),
            });
        }
        if current == '\\' {
            let Some((escape_pos, escaped)) = chars.next() else {
                break;
            };
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                '"' => '"',
                '\'' => '\'',
                _ => {
                    return Err(ConditionError::parse(
                        format!("invalid escape sequence '\\{escaped}'"),
                        escape_pos - 1,
                    ));
                }
            });
            continue;
        }
        out.push(current);
    }

    Err(ConditionError::parse("unterminated string", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_words_keep_scoped_packages_and_paths() {
        let tokens = tokenize("npm:@types/node && file:src/**/*.ts").unwrap();
        assert_eq!(tokens[0].lexeme, "npm:@types/node");
        assert_eq!(tokens[1].kind, TokenKind::AndAnd);
        assert_eq!(tokens[2].lexeme, "file:src/**/*.ts");
        assert_eq!(tokens[2].pos, 19);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("!(a:b) || c:d == e != f < g <= h > i >= j"),
            vec![
                TokenKind::Bang,
                TokenKind::LParen,
                TokenKind::Word,
                TokenKind::RParen,
                TokenKind::OrOr,
                TokenKind::Word,
                TokenKind::EqEq,
                TokenKind::Word,
                TokenKind::NotEq,
                TokenKind::Word,
                TokenKind::Lt,
                TokenKind::Word,
                TokenKind::Le,
                TokenKind::Word,
                TokenKind::Gt,
                TokenKind::Word,
                TokenKind::Ge,
                TokenKind::Word,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"pkg:name == "a\"b\\c" "#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].lexeme, "a\"b\\c");
        let tokens = tokenize("var:x == 'single'").unwrap();
        assert_eq!(tokens[2].lexeme, "single");
    }

    #[test]
    fn test_lex_errors_carry_offsets() {
        let err = tokenize("npm:a & npm:b").unwrap_err();
        assert_eq!(err.offset(), Some(6));
        let err = tokenize("pkg:x == \"open").unwrap_err();
        assert_eq!(err.offset(), Some(9));
        let err = tokenize("pkg:x = 1").unwrap_err();
        assert_eq!(err.offset(), Some(6));
    }
}
