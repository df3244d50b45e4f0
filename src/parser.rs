use thiserror::Error;
use tracing::trace;

use crate::ast::SExpr;
use crate::cursor::Cursor;

pub type ParseResult<T> = Result<T, ParseError>;

/// A parse failure. The first malformed construct aborts the parse;
/// there is no resynchronization or partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated literal at {line}:{column}: {context}")]
    UnterminatedLiteral { line: u32, column: u32, context: String },

    #[error("unsupported escape sequence '\\{escape}' at {line}:{column}: {context}")]
    UnsupportedEscape {
        escape: char,
        line: u32,
        column: u32,
        context: String,
    },

    #[error("unexpected character '{found}' at {line}:{column}: {context}")]
    UnexpectedCharacter {
        found: char,
        line: u32,
        column: u32,
        context: String,
    },

    #[error("missing '{expected}' at {line}:{column}: {context}")]
    MissingDelimiter {
        expected: char,
        line: u32,
        column: u32,
        context: String,
    },
}

impl ParseError {
    fn unterminated(cur: &Cursor) -> ParseError {
        ParseError::UnterminatedLiteral {
            line: cur.line(),
            column: cur.column(),
            context: cur.window(),
        }
    }

    fn unsupported_escape(escape: char, cur: &Cursor) -> ParseError {
        ParseError::UnsupportedEscape {
            escape,
            line: cur.line(),
            column: cur.column(),
            context: cur.window(),
        }
    }

    fn unexpected(found: char, cur: &Cursor) -> ParseError {
        ParseError::UnexpectedCharacter {
            found,
            line: cur.line(),
            column: cur.column(),
            context: cur.window(),
        }
    }

    fn missing(expected: char, cur: &Cursor) -> ParseError {
        ParseError::MissingDelimiter {
            expected,
            line: cur.line(),
            column: cur.column(),
            context: cur.window(),
        }
    }
}

/// Parse a whole source string into its ordered top-level forms.
pub fn parse(src: &str) -> ParseResult<Vec<SExpr>> {
    let mut cur = Cursor::new(src);
    let mut forms = Vec::new();

    skip_whitespace(&mut cur);
    while cur.current().is_some() {
        forms.push(parse_expr(&mut cur)?);
        skip_whitespace(&mut cur);
    }

    Ok(forms)
}

/// Parse a single expression, dispatching on the current character.
fn parse_expr(cur: &mut Cursor) -> ParseResult<SExpr> {
    skip_whitespace(cur);
    trace!(at = %cur, "parse_expr");

    match cur.current() {
        Some('(') => parse_group(cur),
        Some('[') => parse_seq(cur),
        Some('"') => parse_string(cur),
        Some('#') => parse_raw_string(cur),
        Some('{') => parse_map(cur),
        Some(_) => parse_atom(cur),
        None => Err(ParseError::unterminated(cur)),
    }
}

/// Whitespace and `;` comments may appear anywhere between tokens.
fn skip_whitespace(cur: &mut Cursor) {
    while let Some(c) = cur.current() {
        if c.is_whitespace() {
            cur.advance();
        } else if c == ';' {
            while !matches!(cur.current(), Some('\n') | None) {
                cur.advance();
            }
            cur.advance();
        } else {
            break;
        }
    }
}

fn is_structural(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | ':' | ',')
}

fn parse_atom(cur: &mut Cursor) -> ParseResult<SExpr> {
    let mut value = String::new();
    while let Some(c) = cur.current() {
        if is_structural(c) || c.is_whitespace() {
            break;
        }
        value.push(c);
        cur.advance();
    }

    if value.is_empty() {
        // A structural delimiter where an expression was expected,
        // e.g. a stray ')' at the top level.
        return match cur.current() {
            Some(c) => Err(ParseError::unexpected(c, cur)),
            None => Err(ParseError::unterminated(cur)),
        };
    }

    Ok(SExpr::Atom(value))
}

fn parse_string(cur: &mut Cursor) -> ParseResult<SExpr> {
    cur.advance(); // opening '"'

    let mut value = String::new();
    loop {
        match cur.current() {
            None => return Err(ParseError::unterminated(cur)),
            Some('"') => {
                cur.advance();
                break;
            }
            Some('\\') => {
                cur.advance();
                let decoded = match cur.current() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some(other) => return Err(ParseError::unsupported_escape(other, cur)),
                    None => return Err(ParseError::unterminated(cur)),
                };
                value.push(decoded);
                cur.advance();
            }
            Some(c) => {
                value.push(c);
                cur.advance();
            }
        }
    }

    Ok(SExpr::Str(value))
}

/// `#`, an optional alphanumeric tag, then `"`. Content is verbatim; a `"`
/// only closes the literal when immediately followed by the complete tag.
/// A partial tag match is kept as literal content and scanning resumes.
fn parse_raw_string(cur: &mut Cursor) -> ParseResult<SExpr> {
    cur.advance(); // '#'

    let mut tag = String::new();
    while let Some(c) = cur.current() {
        if c.is_alphanumeric() {
            tag.push(c);
            cur.advance();
        } else {
            break;
        }
    }

    match cur.current() {
        Some('"') => cur.advance(),
        Some(c) => return Err(ParseError::unexpected(c, cur)),
        None => return Err(ParseError::unterminated(cur)),
    }

    let mut value = String::new();
    loop {
        match cur.current() {
            None => return Err(ParseError::unterminated(cur)),
            Some('"') => {
                cur.advance();

                let mut seen = String::new();
                for expected in tag.chars() {
                    match cur.current() {
                        Some(c) if c == expected => {
                            seen.push(c);
                            cur.advance();
                        }
                        _ => break,
                    }
                }
                if seen.len() == tag.len() {
                    break;
                }

                value.push('"');
                value.push_str(&seen);
            }
            Some(c) => {
                value.push(c);
                cur.advance();
            }
        }
    }

    Ok(SExpr::Str(value))
}

fn parse_group(cur: &mut Cursor) -> ParseResult<SExpr> {
    cur.advance(); // '('

    let mut elements = Vec::new();
    loop {
        skip_whitespace(cur);
        match cur.current() {
            None => return Err(ParseError::missing(')', cur)),
            Some(')') => {
                cur.advance();
                break;
            }
            Some(_) => elements.push(parse_expr(cur)?),
        }
    }

    Ok(SExpr::Group(elements))
}

fn parse_seq(cur: &mut Cursor) -> ParseResult<SExpr> {
    cur.advance(); // '['

    let mut elements = Vec::new();
    loop {
        skip_whitespace(cur);
        match cur.current() {
            None => return Err(ParseError::unterminated(cur)),
            Some(']') => {
                cur.advance();
                break;
            }
            Some(_) => {
                elements.push(parse_expr(cur)?);
                skip_whitespace(cur);
                // Separating commas carry no meaning.
                if cur.current() == Some(',') {
                    cur.advance();
                }
            }
        }
    }

    Ok(SExpr::Seq(elements))
}

fn parse_map(cur: &mut Cursor) -> ParseResult<SExpr> {
    cur.advance(); // '{'

    let mut entries = Vec::new();
    loop {
        skip_whitespace(cur);
        match cur.current() {
            None => return Err(ParseError::unterminated(cur)),
            Some('}') => {
                cur.advance();
                break;
            }
            Some(_) => {
                let key = parse_expr(cur)?;

                skip_whitespace(cur);
                match cur.current() {
                    Some(':') => cur.advance(),
                    _ => return Err(ParseError::missing(':', cur)),
                }

                let value = parse_expr(cur)?;
                entries.push((key, value));

                skip_whitespace(cur);
                if cur.current() == Some(',') {
                    cur.advance();
                }
            }
        }
    }

    Ok(SExpr::Map(entries))
}
