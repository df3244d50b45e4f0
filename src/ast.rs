use std::fmt;
use std::fmt::Formatter;

/// A parsed expression. Nodes never change after construction and two
/// nodes are equal iff their variant and contents are recursively equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    /// A bare token. The parser assigns it no meaning of its own.
    Atom(String),
    /// A string literal with escapes (or raw-string content) already decoded.
    Str(String),
    /// A parenthesized call form `(...)`.
    Group(Vec<SExpr>),
    /// A bracketed list literal `[...]`.
    Seq(Vec<SExpr>),
    /// A braced literal `{k: v, ...}`. Keys are full expressions and
    /// duplicates are representable here; they are resolved at evaluation.
    Map(Vec<(SExpr, SExpr)>),
}

impl SExpr {
    pub fn atom<A: AsRef<str>>(value: A) -> SExpr {
        SExpr::Atom(value.as_ref().to_owned())
    }

    pub fn string<A: AsRef<str>>(value: A) -> SExpr {
        SExpr::Str(value.as_ref().to_owned())
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Atom(value) => write!(f, "{}", value),
            SExpr::Str(value) => write!(f, "\"{}\"", escape(value)),
            SExpr::Group(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            SExpr::Seq(elements) => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            SExpr::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}
