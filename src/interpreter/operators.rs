//! Operator semantics for the evaluator, dispatched on the operator and the
//! runtime kinds of its operands.

use crate::parser::Operator;

use super::error::Error;
use super::value::Value;

fn mismatch(op: Operator, left: &Value, right: &Value) -> Error {
    Error::Type(format!(
        "unsupported operand types for {op}: {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

// Integer results that overflow continue as floats.
fn checked_or_float(result: Option<i64>, fallback: f64) -> Value {
    result.map_or(Value::Float(fallback), Value::Integer)
}

pub(super) fn evaluate_binary(op: Operator, left: Value, right: Value) -> Result<Value, Error> {
    match op {
        Operator::And => Ok(if left.is_truthy() { right } else { left }),
        Operator::Or => Ok(if left.is_truthy() { left } else { right }),
        Operator::Equal => Ok(Value::Boolean(left.loosely_equals(&right))),
        Operator::NotEqual => Ok(Value::Boolean(!left.loosely_equals(&right))),
        Operator::LessThan
        | Operator::LessThanEqual
        | Operator::GreaterThan
        | Operator::GreaterThanEqual => compare(op, &left, &right),
        Operator::Plus => add(left, right),
        Operator::Minus | Operator::Times => arithmetic(op, &left, &right),
        Operator::Divide => divide(&left, &right),
        Operator::Not | Operator::Negate => Err(Error::UnknownOperator(op)),
    }
}

pub(super) fn evaluate_unary(op: Operator, operand: Value) -> Result<Value, Error> {
    match (op, operand) {
        (Operator::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
        (Operator::Negate, Value::Integer(i)) => Ok(checked_or_float(i.checked_neg(), -(i as f64))),
        (Operator::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
        (Operator::Negate, value) => Err(Error::Type(format!(
            "bad operand type for negation: {}",
            value.type_name()
        ))),
        (op, _) => Err(Error::UnknownOperator(op)),
    }
}

fn add(left: Value, right: Value) -> Result<Value, Error> {
    match (left, right) {
        (Value::Text(mut a), Value::Text(b)) => {
            a.push_str(&b);
            Ok(Value::Text(a))
        }
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (left, right) => arithmetic(Operator::Plus, &left, &right),
    }
}

fn arithmetic(op: Operator, left: &Value, right: &Value) -> Result<Value, Error> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let (fa, fb) = (a as f64, b as f64);
        return match op {
            Operator::Plus => Ok(checked_or_float(a.checked_add(b), fa + fb)),
            Operator::Minus => Ok(checked_or_float(a.checked_sub(b), fa - fb)),
            Operator::Times => Ok(checked_or_float(a.checked_mul(b), fa * fb)),
            _ => Err(Error::UnknownOperator(op)),
        };
    }
    let (a, b) = as_floats(left, right).ok_or_else(|| mismatch(op, left, right))?;
    match op {
        Operator::Plus => Ok(Value::Float(a + b)),
        Operator::Minus => Ok(Value::Float(a - b)),
        Operator::Times => Ok(Value::Float(a * b)),
        _ => Err(Error::UnknownOperator(op)),
    }
}

/// Real division: exact integer quotients stay integers, everything else is
/// a float.
fn divide(left: &Value, right: &Value) -> Result<Value, Error> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        if *b == 0 {
            return Err(Error::DivisionByZero);
        }
        if a.checked_rem(*b) == Some(0) {
            return Ok(checked_or_float(a.checked_div(*b), *a as f64 / *b as f64));
        }
        return Ok(Value::Float(*a as f64 / *b as f64));
    }
    let (a, b) = as_floats(left, right).ok_or_else(|| mismatch(Operator::Divide, left, right))?;
    if b == 0.0 {
        return Err(Error::DivisionByZero);
    }
    Ok(Value::Float(a / b))
}

fn compare(op: Operator, left: &Value, right: &Value) -> Result<Value, Error> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => {
            let (a, b) = as_floats(left, right).ok_or_else(|| mismatch(op, left, right))?;
            a.partial_cmp(&b)
        }
    };
    // NaN compares false against everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Boolean(false));
    };
    let result = match op {
        Operator::LessThan => ordering.is_lt(),
        Operator::LessThanEqual => ordering.is_le(),
        Operator::GreaterThan => ordering.is_gt(),
        Operator::GreaterThanEqual => ordering.is_ge(),
        _ => return Err(Error::UnknownOperator(op)),
    };
    Ok(Value::Boolean(result))
}

fn as_floats(left: &Value, right: &Value) -> Option<(f64, f64)> {
    let number = |value: &Value| match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    };
    Some((number(left)?, number(right)?))
}
