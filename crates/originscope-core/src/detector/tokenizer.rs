//! Lexical tokenizer for routine source text.
//!
//! This is a structural scanner, not a SQL grammar: it knows string literals
//! (including `''` doubling and the `N'...'` prefix), bracketed and quoted
//! identifiers, line and nested block comments, and punctuation. Comments and
//! whitespace are consumed, never emitted. Every token carries its byte span
//! in the original text so callers can slice expressions and excerpts out of
//! the source verbatim.

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset from start of the text (inclusive).
    pub start: usize,
    /// Byte offset from start of the text (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword. `quoted` is true for `[x]` / `"x"` forms,
    /// which can never be keywords.
    Word { value: String, quoted: bool },
    Number(String),
    /// String literal content with quotes stripped and `''` collapsed.
    StringLiteral(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Eq,
    Semicolon,
    Operator(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// True for an unquoted word equal to `kw`, case-insensitively.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(&self.kind, TokenKind::Word { value, quoted: false } if value.eq_ignore_ascii_case(kw))
    }

    /// The word value, for both plain and quoted identifiers.
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word { value, .. } => Some(value),
            _ => None,
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '@' | '#' | '$')
}

fn is_word_part(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

/// Tokenize routine text. Never fails: unrecognized characters become
/// [`TokenKind::Operator`] tokens and unterminated constructs run to the end
/// of input.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let byte_end = |i: usize| -> usize {
        chars
            .get(i + 1)
            .map(|(pos, _)| *pos)
            .unwrap_or(sql.len())
    };

    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        match ch {
            c if c.is_whitespace() => {
                i += 1;
            }
            // line comment
            '-' if matches!(chars.get(i + 1), Some((_, '-'))) => {
                i += 2;
                while i < chars.len() && chars[i].1 != '\n' {
                    i += 1;
                }
            }
            // block comment; T-SQL block comments nest
            '/' if matches!(chars.get(i + 1), Some((_, '*'))) => {
                i += 2;
                let mut depth = 1usize;
                while i < chars.len() && depth > 0 {
                    if chars[i].1 == '/' && matches!(chars.get(i + 1), Some((_, '*'))) {
                        depth += 1;
                        i += 2;
                    } else if chars[i].1 == '*' && matches!(chars.get(i + 1), Some((_, '/'))) {
                        depth -= 1;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }
            '\'' => {
                let (token, next) = read_string(sql, &chars, i, pos);
                tokens.push(token);
                i = next;
            }
            'N' | 'n' if matches!(chars.get(i + 1), Some((_, '\''))) => {
                let (token, next) = read_string(sql, &chars, i + 1, pos);
                tokens.push(token);
                i = next;
            }
            '[' => {
                let (token, next) = read_delimited(sql, &chars, i, pos, ']');
                tokens.push(token);
                i = next;
            }
            '"' => {
                let (token, next) = read_delimited(sql, &chars, i, pos, '"');
                tokens.push(token);
                i = next;
            }
            c if is_word_start(c) => {
                let mut value = String::new();
                let start = pos;
                let mut end = byte_end(i);
                while i < chars.len() && is_word_part(chars[i].1) {
                    value.push(chars[i].1);
                    end = byte_end(i);
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word {
                        value,
                        quoted: false,
                    },
                    span: Span::new(start, end),
                });
            }
            c if c.is_ascii_digit() => {
                let mut value = String::new();
                let start = pos;
                let mut end = byte_end(i);
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    value.push(chars[i].1);
                    end = byte_end(i);
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    span: Span::new(start, end),
                });
            }
            _ => {
                let kind = match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '=' => TokenKind::Eq,
                    ';' => TokenKind::Semicolon,
                    c => TokenKind::Operator(c),
                };
                tokens.push(Token {
                    kind,
                    span: Span::new(pos, byte_end(i)),
                });
                i += 1;
            }
        }
    }

    tokens
}

/// Read a `'...'` literal starting at the opening quote index `quote_i`.
/// `span_start` covers a leading `N` prefix when present.
fn read_string(
    sql: &str,
    chars: &[(usize, char)],
    quote_i: usize,
    span_start: usize,
) -> (Token, usize) {
    let byte_end = |i: usize| -> usize {
        chars
            .get(i + 1)
            .map(|(pos, _)| *pos)
            .unwrap_or(sql.len())
    };

    let mut content = String::new();
    let mut i = quote_i + 1;
    let mut end = sql.len();
    while i < chars.len() {
        if chars[i].1 == '\'' {
            if matches!(chars.get(i + 1), Some((_, '\''))) {
                content.push('\'');
                i += 2;
                continue;
            }
            end = byte_end(i);
            i += 1;
            break;
        }
        content.push(chars[i].1);
        i += 1;
    }
    (
        Token {
            kind: TokenKind::StringLiteral(content),
            span: Span::new(span_start, end),
        },
        i,
    )
}

/// Read a delimited identifier (`[x]` or `"x"`), with doubled closers as
/// escapes.
fn read_delimited(
    sql: &str,
    chars: &[(usize, char)],
    open_i: usize,
    span_start: usize,
    closer: char,
) -> (Token, usize) {
    let byte_end = |i: usize| -> usize {
        chars
            .get(i + 1)
            .map(|(pos, _)| *pos)
            .unwrap_or(sql.len())
    };

    let mut value = String::new();
    let mut i = open_i + 1;
    let mut end = sql.len();
    while i < chars.len() {
        if chars[i].1 == closer {
            if matches!(chars.get(i + 1), Some((_, c)) if *c == closer) {
                value.push(closer);
                i += 2;
                continue;
            }
            end = byte_end(i);
            i += 1;
            break;
        }
        value.push(chars[i].1);
        i += 1;
    }
    (
        Token {
            kind: TokenKind::Word {
                value,
                quoted: true,
            },
            span: Span::new(span_start, end),
        },
        i,
    )
}
