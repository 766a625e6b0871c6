use std::rc::Rc;

use derivative::Derivative;

use super::tokenizer::{Literal, Token, TokenType as TT};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(Number),
    StringLiteral(String),
    Boolean(bool),
    Null,
    Identifier(Name),
    BinaryOp(Operator, Box<(Node, Node)>),
    UnaryOp(Operator, Box<Node>),
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
    Print(Option<Box<Node>>),
    Assign(Name, Box<Node>),
    If(Box<Node>, Box<Node>, Option<Box<Node>>),
    While(Box<Node>, Box<Node>),
    Return(Option<Box<Node>>),
    Block(Vec<Node>),
    Program(Vec<Node>),
    Function(Rc<Function>),
    Call(Box<Node>, Vec<Node>),
    Index(Box<Node>, Option<Box<Node>>),
}

impl Node {
    pub(super) fn binary(op: Operator, left: Node, right: Node) -> Self {
        Self::BinaryOp(op, Box::new((left, right)))
    }
    pub(super) fn unary(op: Operator, operand: Node) -> Self {
        Self::UnaryOp(op, Box::new(operand))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

/// A name together with the position it was read from. Two names are
/// equal when their names are, wherever they appear in the source.
#[derive(Derivative, Clone)]
#[derivative(PartialEq)]
pub struct Name {
    pub name: String,
    #[derivative(PartialEq = "ignore")]
    pub position: Option<usize>,
}

impl Name {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: None,
        }
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name(\"{}\")", self.name)
    }
}

impl TryFrom<&Token> for Name {
    type Error = ();

    fn try_from(value: &Token) -> Result<Self, Self::Error> {
        match (&value.typ, &value.value) {
            (TT::NAME, Literal::Text(name)) => Ok(Self {
                name: name.clone(),
                position: Some(value.position),
            }),
            _ => Err(()),
        }
    }
}

/// A function literal: parameter names and a block body. It captures no
/// environment; free names resolve wherever the function is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub parameters: Vec<Name>,
    pub body: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    And,
    Not,
    Negate,
    Plus,
    Minus,
    Times,
    Divide,
    Equal,
    NotEqual,
    LessThanEqual,
    LessThan,
    GreaterThanEqual,
    GreaterThan,
}

impl TryFrom<&Token> for Operator {
    type Error = ();

    fn try_from(value: &Token) -> Result<Self, Self::Error> {
        let op = match value.typ {
            TT::DOUBLEVBAR => Self::Or,
            TT::DOUBLEAMPER => Self::And,
            TT::EXCLAMATION => Self::Not,
            TT::PLUS => Self::Plus,
            TT::MINUS => Self::Minus,
            TT::STAR => Self::Times,
            TT::SLASH => Self::Divide,
            TT::EQEQUAL => Self::Equal,
            TT::NOTEQUAL => Self::NotEqual,
            TT::LESSEQUAL => Self::LessThanEqual,
            TT::LESS => Self::LessThan,
            TT::GREATEREQUAL => Self::GreaterThanEqual,
            TT::GREATER => Self::GreaterThan,
            _ => return Err(()),
        };
        Ok(op)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Not => "!",
            Self::Negate => "negate",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThanEqual => "<=",
            Self::LessThan => "<",
            Self::GreaterThanEqual => ">=",
            Self::GreaterThan => ">",
        };
        f.write_str(symbol)
    }
}
