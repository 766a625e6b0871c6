mod parser;
pub use parser::locations::{Locatable, Location};
pub use parser::tokenizer::{Literal, Token, TokenType, Tokenizer};
pub use parser::{parse, Function, Name, Node, Number, Operator, MAX_NESTING};

mod interpreter;
mod stack;
pub use interpreter::{evaluate, Environment, Evaluator, Flow, ScopeId, Value, MAX_CALL_DEPTH};

pub type SyntaxError = parser::Error;
pub type RuntimeError = interpreter::Error;

/// Splits `text` into tokens, ending with an `ENDMARKER` sentinel.
pub fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    parser::tokenize_string(text)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl Locatable for Error {
    fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax(e) => e.position(),
            Self::Runtime(_) => None,
        }
    }
}

/// Tokenizes, parses and evaluates `text` against `environment`, printing to
/// standard output.
pub fn run(text: &str, environment: &mut Environment) -> Result<Flow, Error> {
    let tokens = tokenize(text)?;
    execute(&tokens, environment)
}

/// Like [`run`], but with a `tokenizer` built once by the caller, as a
/// session running many inputs does.
pub fn run_with(
    tokenizer: &Tokenizer,
    text: &str,
    environment: &mut Environment,
) -> Result<Flow, Error> {
    let tokens = tokenizer.tokenize(text)?;
    execute(&tokens, environment)
}

fn execute(tokens: &[Token], environment: &mut Environment) -> Result<Flow, Error> {
    let tree = parse(tokens)?;
    Ok(evaluate(&tree, environment)?)
}
