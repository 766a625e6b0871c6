use crate::parser::Operator;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[error("key \"{0}\" not found")]
    KeyNotFound(String),
    #[error("unknown operator '{0}'")]
    UnknownOperator(Operator),
    #[error("function expects {expected} argument(s), got {found}")]
    ArgumentCount { expected: usize, found: usize },
    #[error("call depth exceeds {0} frames")]
    RecursionLimit(usize),
    #[error("could not write output: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
