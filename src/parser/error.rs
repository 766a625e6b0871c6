#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unexpected character at position {position}")]
    Tokenize { position: usize },
    #[error("invalid number literal '{lexeme}' at position {position}")]
    InvalidNumber { lexeme: String, position: usize },
    #[error("expected {expected}, found {found} at position {position}")]
    Parse {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("could not build tokenizer rules: {0}")]
    Rules(String),
}

impl Error {
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Tokenize { position }
            | Self::InvalidNumber { position, .. }
            | Self::Parse { position, .. } => Some(*position),
            Self::Rules(_) => None,
        }
    }
}
