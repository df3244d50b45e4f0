use std::fmt;
use std::fmt::Formatter;

/// How many characters to show on each side of the current
/// offset when rendering a diagnostic context window.
const WINDOW: usize = 8;

/// A scan position over an immutable piece of source text.
///
/// `current` returns `None` once the end of the input is reached;
/// advancing past the end keeps returning `None`.
#[derive(Debug, Clone)]
pub struct Cursor {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new(src: &str) -> Self {
        Cursor {
            chars: src.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    /// The code point at the current position, or `None` at end of stream.
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Move to the next code point. A newline bumps the line counter and
    /// resets the column; any other character bumps the column.
    pub fn advance(&mut self) {
        match self.chars.get(self.index) {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => return,
        }
        self.index += 1;
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// The rendered context window, as used in parse errors.
    pub fn window(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let start = self.index.saturating_sub(WINDOW);
        let end = (self.index + WINDOW).min(self.chars.len());

        let mut parts = Vec::with_capacity(end - start + 1);
        for i in start..end {
            let ch = self.chars[i];
            let text = match ch {
                ' ' => "\u{b7}".to_owned(),
                '\n' => "\\n".to_owned(),
                '\t' => "\\t".to_owned(),
                c if c.is_control() => format!("\\x{:02x}", c as u32),
                c => c.to_string(),
            };

            if i == self.index {
                parts.push(format!("[{}]", text));
            } else {
                parts.push(text);
            }
        }

        if self.index >= self.chars.len() {
            parts.push("[eos]".to_owned());
        }

        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cur = Cursor::new("ab\ncd");
        assert_eq!((cur.line(), cur.column()), (1, 1));
        assert_eq!(cur.current(), Some('a'));

        cur.advance();
        assert_eq!((cur.line(), cur.column()), (1, 2));
        cur.advance(); // past 'b', now at '\n'
        assert_eq!((cur.line(), cur.column()), (1, 3));
        cur.advance(); // past '\n'
        assert_eq!((cur.line(), cur.column()), (2, 1));
        assert_eq!(cur.current(), Some('c'));
        cur.advance();
        assert_eq!((cur.line(), cur.column()), (2, 2));
    }

    #[test]
    fn advancing_past_the_end_is_idempotent() {
        let mut cur = Cursor::new("x");
        cur.advance();
        assert_eq!(cur.current(), None);

        let column = cur.column();
        cur.advance();
        cur.advance();
        assert_eq!(cur.current(), None);
        assert_eq!(cur.column(), column);
    }

    #[test]
    fn empty_input_starts_at_the_end() {
        let cur = Cursor::new("");
        assert_eq!(cur.current(), None);
        assert_eq!(cur.to_string(), "[eos]");
    }

    #[test]
    fn window_escapes_nonprintables() {
        let mut cur = Cursor::new("a b\tc");
        cur.advance();
        assert_eq!(cur.to_string(), "a [\u{b7}] b \\t c");
    }

    #[test]
    fn window_is_bounded() {
        let mut cur = Cursor::new("abcdefghijklmnopqrstuvwxyz");
        for _ in 0..13 {
            cur.advance();
        }
        assert_eq!(cur.to_string(), "f g h i j k l m [n] o p q r s t u");
    }
}
