mod environment;
mod error;
mod operators;
mod value;

use std::io::Write;
use std::rc::Rc;

use crate::parser::{Function, Node};
use crate::stack::ensure_sufficient_stack;

pub use environment::{Environment, ScopeId};
pub use error::Error;
pub use value::Value;

/// Default nesting limit for calls; deeper calls fail instead of exhausting
/// the host stack.
pub const MAX_CALL_DEPTH: usize = 200;

/// Outcome of evaluating a node: either an ordinary value, or a value on its
/// way out of the enclosing function because of a `return`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Value(Value),
    Return(Value),
}

impl Flow {
    pub fn value(&self) -> &Value {
        match self {
            Self::Value(v) | Self::Return(v) => v,
        }
    }
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(v) | Self::Return(v) => v,
        }
    }
    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return(_))
    }
}

/// Evaluates `node` against `environment`, printing to standard output.
pub fn evaluate(node: &Node, environment: &mut Environment) -> Result<Flow, Error> {
    let mut stdout = std::io::stdout().lock();
    Evaluator::new(&mut stdout).evaluate(node, environment)
}

pub struct Evaluator<'w, W: Write> {
    out: &'w mut W,
    depth: usize,
    max_depth: usize,
}

impl<'w, W: Write> Evaluator<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self {
            out,
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
        }
    }

    pub fn with_call_limit(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluates `node` against `env`. Nesting is bounded by the parser and
    /// calls by the call limit; the stack grows on demand between the two.
    pub fn evaluate(&mut self, node: &Node, env: &mut Environment) -> Result<Flow, Error> {
        ensure_sufficient_stack(|| self.evaluate_node(node, env))
    }

    fn evaluate_node(&mut self, node: &Node, env: &mut Environment) -> Result<Flow, Error> {
        match node {
            Node::Number(number) => Ok(Flow::Value((*number).into())),
            Node::StringLiteral(text) => Ok(Flow::Value(Value::Text(text.clone()))),
            Node::Boolean(b) => Ok(Flow::Value(Value::Boolean(*b))),
            Node::Null => Ok(Flow::Value(Value::Null)),
            Node::Identifier(name) => env
                .lookup(&name.name)
                .cloned()
                .map(Flow::Value)
                .ok_or_else(|| Error::UnknownIdentifier(name.name.clone())),
            Node::BinaryOp(op, operands) => {
                let (left, right) = operands.as_ref();
                let left = self.value(left, env)?;
                let right = self.value(right, env)?;
                operators::evaluate_binary(*op, left, right).map(Flow::Value)
            }
            Node::UnaryOp(op, operand) => {
                let operand = self.value(operand, env)?;
                operators::evaluate_unary(*op, operand).map(Flow::Value)
            }
            Node::List(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.value(element, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Flow::Value(Value::List(items)))
            }
            Node::Map(entries) => {
                let mut map = std::collections::BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.value(value, env)?);
                }
                Ok(Flow::Value(Value::Map(map)))
            }
            Node::Print(value) => {
                match value {
                    Some(value) => {
                        let value = self.value(value, env)?;
                        writeln!(self.out, "{value}")?;
                    }
                    None => writeln!(self.out)?,
                }
                Ok(Flow::Value(Value::Null))
            }
            Node::Assign(target, value) => {
                let value = self.value(value, env)?;
                env.assign(&target.name, value);
                Ok(Flow::Value(Value::Null))
            }
            Node::If(condition, then, otherwise) => {
                let flow = if self.value(condition, env)?.is_truthy() {
                    self.evaluate(then, env)?
                } else if let Some(otherwise) = otherwise {
                    self.evaluate(otherwise, env)?
                } else {
                    Flow::Value(Value::Null)
                };
                Ok(Self::settle(flow))
            }
            Node::While(condition, body) => {
                while self.value(condition, env)?.is_truthy() {
                    let flow = self.evaluate(body, env)?;
                    if flow.is_return() {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Value(Value::Null))
            }
            Node::Return(value) => {
                let value = match value {
                    Some(value) => self.value(value, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Node::Block(statements) | Node::Program(statements) => {
                let mut last = Value::Null;
                for statement in statements {
                    match self.evaluate(statement, env)? {
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Value(value) => last = value,
                    }
                }
                Ok(Flow::Value(last))
            }
            Node::Function(function) => Ok(Flow::Value(Value::Function(Rc::clone(function)))),
            Node::Call(callee, arguments) => self.call_node(callee, arguments, env).map(Flow::Value),
            Node::Index(base, index) => {
                let base = self.value(base, env)?;
                let Some(index) = index else {
                    return Ok(Flow::Value(base));
                };
                let index = self.value(index, env)?;
                index_into(base, index).map(Flow::Value)
            }
        }
    }

    fn value(&mut self, node: &Node, env: &mut Environment) -> Result<Value, Error> {
        self.evaluate(node, env).map(Flow::into_value)
    }

    // Branches of an `if` yield nothing of their own; only a return escapes.
    fn settle(flow: Flow) -> Flow {
        match flow {
            Flow::Return(value) => Flow::Return(value),
            Flow::Value(_) => Flow::Value(Value::Null),
        }
    }

    #[inline(never)]
    fn call_node(
        &mut self,
        callee: &Node,
        arguments: &[Node],
        env: &mut Environment,
    ) -> Result<Value, Error> {
        let function = match self.value(callee, env)? {
            Value::Function(function) => function,
            other => {
                return Err(Error::Type(format!(
                    "{} is not callable",
                    other.type_name()
                )))
            }
        };
        let arguments = arguments
            .iter()
            .map(|argument| self.value(argument, env))
            .collect::<Result<Vec<_>, _>>()?;
        self.call(&function, arguments, env)
    }

    /// Runs `function` in a fresh scope whose parent is the caller's current
    /// scope. A return inside the body ends here and does not reach the caller.
    fn call(
        &mut self,
        function: &Function,
        arguments: Vec<Value>,
        env: &mut Environment,
    ) -> Result<Value, Error> {
        if function.parameters.len() != arguments.len() {
            return Err(Error::ArgumentCount {
                expected: function.parameters.len(),
                found: arguments.len(),
            });
        }
        if self.depth >= self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }
        let caller = env.enter();
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            env.assign(&parameter.name, argument);
        }
        self.depth += 1;
        tracing::debug!(depth = self.depth, arity = function.parameters.len(), "enter call");
        let result = self.evaluate(&function.body, env);
        self.depth -= 1;
        env.leave(caller);
        tracing::debug!(depth = self.depth, ok = result.is_ok(), "leave call");
        result.map(Flow::into_value)
    }
}

fn index_into(base: Value, index: Value) -> Result<Value, Error> {
    match index {
        Value::Integer(i) => element(base, i),
        Value::Float(x) if x.is_finite() && x.fract() == 0.0 => element(base, x as i64),
        Value::Float(x) => Err(Error::Type(format!("index must be integral, got {x}"))),
        Value::Text(key) => match base {
            Value::Map(mut entries) => entries.remove(&key).ok_or(Error::KeyNotFound(key)),
            other => Err(Error::Type(format!(
                "text index requires a map, got {}",
                other.type_name()
            ))),
        },
        other => Err(Error::Type(format!(
            "{} cannot be used as an index",
            other.type_name()
        ))),
    }
}

fn element(base: Value, index: i64) -> Result<Value, Error> {
    let out_of_range = |length| Error::IndexOutOfRange { index, length };
    match base {
        Value::List(mut items) => {
            let length = items.len();
            let position = usize::try_from(index).map_err(|_| out_of_range(length))?;
            if position >= length {
                return Err(out_of_range(length));
            }
            Ok(items.swap_remove(position))
        }
        Value::Text(text) => {
            let length = text.chars().count();
            usize::try_from(index)
                .ok()
                .and_then(|position| text.chars().nth(position))
                .map(|chr| Value::Text(chr.to_string()))
                .ok_or_else(|| out_of_range(length))
        }
        other => Err(Error::Type(format!(
            "numeric index requires a list, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod test;
