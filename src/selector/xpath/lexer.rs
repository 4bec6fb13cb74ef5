//! Tokenizer for axis-language expressions.

use super::{ErrorKind, XPathError};

/// A lexical token with its byte offset in the source expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DoubleDot,
    Star,
    DoubleColon,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Minus,
    Literal(String),
    Number(f64),
    Name(String),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::At => "@",
            Self::Comma => ",",
            Self::Pipe => "|",
            Self::Dot => ".",
            Self::DoubleDot => "..",
            Self::Star => "*",
            Self::DoubleColon => "::",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Minus => "-",
            Self::Literal(s) => return write!(f, "\"{s}\""),
            Self::Number(n) => return write!(f, "{n}"),
            Self::Name(n) => n,
        };
        f.write_str(text)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Splits an expression into tokens.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, XPathError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '/' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '/').is_some() {
                    TokenKind::DoubleSlash
                } else {
                    TokenKind::Slash
                }
            }
            '[' | ']' | '(' | ')' | '@' | ',' | '|' | '*' | '=' | '-' => {
                chars.next();
                match c {
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '@' => TokenKind::At,
                    ',' => TokenKind::Comma,
                    '|' => TokenKind::Pipe,
                    '*' => TokenKind::Star,
                    '=' => TokenKind::Eq,
                    _ => TokenKind::Minus,
                }
            }
            '!' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '=').is_none() {
                    return Err(XPathError::new(expr, offset, ErrorKind::UnexpectedChar('!')));
                }
                TokenKind::NotEq
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if(|&(_, n)| n == '=').is_some();
                match (c, or_equal) {
                    ('<', false) => TokenKind::Lt,
                    ('<', true) => TokenKind::LtEq,
                    (_, false) => TokenKind::Gt,
                    (_, true) => TokenKind::GtEq,
                }
            }
            ':' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == ':').is_none() {
                    return Err(XPathError::new(expr, offset, ErrorKind::UnexpectedChar(':')));
                }
                TokenKind::DoubleColon
            }
            '"' | '\'' => {
                chars.next();
                let start = offset + 1;
                let mut end = None;
                for (i, n) in chars.by_ref() {
                    if n == c {
                        end = Some(i);
                        break;
                    }
                }
                let Some(end) = end else {
                    return Err(XPathError::new(expr, offset, ErrorKind::UnterminatedLiteral));
                };
                TokenKind::Literal(expr[start..end].to_string())
            }
            '.' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '.').is_some() {
                    TokenKind::DoubleDot
                } else if chars.peek().is_some_and(|&(_, n)| n.is_ascii_digit()) {
                    let end = scan_while(&mut chars, expr.len(), |n| n.is_ascii_digit());
                    TokenKind::Number(parse_number(expr, offset, end)?)
                } else {
                    TokenKind::Dot
                }
            }
            d if d.is_ascii_digit() => {
                let end = scan_while(&mut chars, expr.len(), |n| n.is_ascii_digit() || n == '.');
                TokenKind::Number(parse_number(expr, offset, end)?)
            }
            n if is_name_start(n) => {
                let end = scan_while(&mut chars, expr.len(), is_name_char);
                TokenKind::Name(expr[offset..end].to_string())
            }
            other => {
                return Err(XPathError::new(expr, offset, ErrorKind::UnexpectedChar(other)));
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn scan_while(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    len: usize,
    pred: impl Fn(char) -> bool,
) -> usize {
    while chars.next_if(|&(_, c)| pred(c)).is_some() {}
    chars.peek().map_or(len, |&(i, _)| i)
}

fn parse_number(expr: &str, start: usize, end: usize) -> Result<f64, XPathError> {
    expr[start..end]
        .parse::<f64>()
        .map_err(|_| XPathError::new(expr, start, ErrorKind::UnexpectedToken(expr[start..end].to_string())))
}
