use super::ast::Name;
use super::error::Error;
use super::tokenizer::Token;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Resolves a byte offset into `text` to a 1-based line and column.
    /// Offsets past the end clamp to the position after the last character.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut location = Self { line: 1, column: 1 };
        for (index, chr) in text.char_indices() {
            if index >= offset {
                break;
            }
            if chr == '\n' {
                location.line += 1;
                location.column = 1;
            } else {
                location.column += 1;
            }
        }
        location
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

pub trait Locatable {
    fn position(&self) -> Option<usize>;

    fn location(&self, text: &str) -> Option<Location> {
        self.position().map(|offset| Location::from_offset(text, offset))
    }
}

impl Locatable for Token {
    fn position(&self) -> Option<usize> {
        Some(self.position)
    }
}

impl Locatable for Name {
    fn position(&self) -> Option<usize> {
        self.position
    }
}

impl Locatable for Error {
    fn position(&self) -> Option<usize> {
        Error::position(self)
    }
}
