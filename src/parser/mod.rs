mod ast;
mod combinators;
mod error;
mod grammar;
pub mod locations;
pub mod tokenizer;

pub use ast::*;
pub use error::Error;
pub use grammar::{parse, MAX_NESTING};
pub use tokenizer::tokenize_string;
