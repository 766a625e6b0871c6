use pretty_assertions::assert_eq;

use super::{Environment, Error, Evaluator, Flow, ScopeId, Value, MAX_CALL_DEPTH};
use crate::parser::{parse, tokenize_string, Node, Number, Operator};

fn parse_program(input: &str) -> Node {
    let tokens = tokenize_string(input).unwrap();
    parse(&tokens).unwrap()
}

/// Evaluates `input` against `env`, returning the outcome and everything the
/// program printed.
fn run_in(input: &str, env: &mut Environment) -> (Result<Flow, Error>, String) {
    let tree = parse_program(input);
    let mut out = Vec::new();
    let result = Evaluator::new(&mut out).evaluate(&tree, env);
    (result, String::from_utf8(out).unwrap())
}

fn evaluates_to(input: &str, expected: Value) {
    let mut env = Environment::new();
    let (result, _) = run_in(input, &mut env);
    assert_eq!(result, Ok(Flow::Value(expected)), "{input}");
}

fn assert_raises(input: &str, expected: Error) {
    let mut env = Environment::new();
    let (result, _) = run_in(input, &mut env);
    assert_eq!(result, Err(expected), "{input}");
}

fn assert_type_error(input: &str) {
    let mut env = Environment::new();
    let (result, _) = run_in(input, &mut env);
    assert!(matches!(result, Err(Error::Type(_))), "{input}: {result:?}");
}

fn prints(input: &str) -> String {
    let mut env = Environment::new();
    let (result, out) = run_in(input, &mut env);
    assert!(result.is_ok(), "failed to run \"{input}\": {result:?}");
    out
}

fn list(items: &[i64]) -> Value {
    Value::List(items.iter().map(|i| Value::Integer(*i)).collect())
}

#[test]
fn test_pure_expressions() {
    let mut env = Environment::new();
    let (result, out) = run_in("3+4*2", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Integer(11))));
    assert!(env.local_bindings().is_empty());
    assert_eq!(out, "");
    let (again, _) = run_in("3+4*2", &mut env);
    assert_eq!(again, result);
    assert!(env.local_bindings().is_empty());
    evaluates_to("(3+4)*2", Value::Integer(14));
    evaluates_to("8-4-2", Value::Integer(2));
    evaluates_to("-2*3", Value::Integer(-6));
    evaluates_to("1.5 + 1", Value::Float(2.5));
}

#[test]
fn test_division() {
    evaluates_to("5/2", Value::Float(2.5));
    evaluates_to("4/2", Value::Integer(2));
    evaluates_to("-6/3", Value::Integer(-2));
    evaluates_to("1.0/4", Value::Float(0.25));
    assert_raises("1/0", Error::DivisionByZero);
    assert_raises("1.0/0", Error::DivisionByZero);
}

#[test]
fn test_integer_overflow_continues_as_float() {
    evaluates_to("9223372036854775807 + 1", Value::Float(9223372036854775808.0));
    evaluates_to("-9223372036854775807 - 2", Value::Float(-9223372036854775808.0));
}

#[test]
fn test_print_then_bind() {
    let mut env = Environment::new();
    let (result, out) = run_in("x=5; print(x+1)", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Null)));
    assert_eq!(out, "6\n");
    assert_eq!(env.local("x"), Some(&Value::Integer(5)));
    assert_eq!(env.local_bindings().len(), 1);
}

#[test]
fn test_print_forms() {
    assert_eq!(prints("print()"), "\n");
    assert_eq!(prints("print"), "\n");
    assert_eq!(prints("print 77"), "77\n");
    assert_eq!(prints("print \"hi\""), "hi\n");
    assert_eq!(prints("print 4/2; print 2.0; print 0.5"), "2\n2.0\n0.5\n");
    assert_eq!(prints("print [1, \"a\", null]"), "[1, \"a\", null]\n");
    assert_eq!(prints("print {\"b\": 2, \"a\": [true]}"), "{\"a\": [true], \"b\": 2}\n");
    assert_eq!(prints("function f(a, b){a}; print(f)"), "<function(a, b)>\n");
}

#[test]
fn test_if_else() {
    let mut env = Environment::from([("x", Value::Integer(0))]);
    let (result, _) = run_in("if(0) {x=1} else {x=2}", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Null)));
    assert_eq!(env.local("x"), Some(&Value::Integer(2)));

    let mut env = Environment::new();
    run_in("if(1) x=1", &mut env).0.unwrap();
    assert_eq!(env.local("x"), Some(&Value::Integer(1)));

    let mut env = Environment::new();
    run_in("if(0) x=1", &mut env).0.unwrap();
    assert_eq!(env.local("x"), None);
}

#[test]
fn test_truthiness() {
    for (condition, expected) in [
        ("[]", 2),
        ("[0]", 1),
        ("\"\"", 2),
        ("\"a\"", 1),
        ("0.0", 2),
        ("null", 2),
        ("{}", 2),
        ("function(){}", 1),
    ] {
        let mut env = Environment::new();
        let program = format!("if({condition}) {{x=1}} else {{x=2}}");
        run_in(&program, &mut env).0.unwrap();
        assert_eq!(env.local("x"), Some(&Value::Integer(expected)), "{condition}");
    }
}

#[test]
fn test_while() {
    let mut env = Environment::new();
    let (result, _) = run_in("x=1; while(x<4) {x=x+1}", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Null)));
    assert_eq!(env.local("x"), Some(&Value::Integer(4)));
    assert_eq!(prints("i = 0; while(i < 3) { print i; i = i + 1 }"), "0\n1\n2\n");
}

#[test]
fn test_assignment_writes_only_the_current_scope() {
    let mut env = Environment::from([("x", Value::Integer(5))]);
    let caller = env.enter();
    env.assign("x", Value::Integer(1));
    let (result, _) = run_in("x=x+1", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Null)));
    assert_eq!(env.local("x"), Some(&Value::Integer(2)));
    assert_eq!(
        env.parent_bindings().and_then(|parent| parent.get("x")),
        Some(&Value::Integer(5))
    );
    env.leave(caller);
    assert_eq!(env.current(), ScopeId::ROOT);
    assert_eq!(env.lookup("x"), Some(&Value::Integer(5)));
}

#[test]
fn test_lookup_walks_outwards() {
    let mut env = Environment::from([("y", Value::Integer(3))]);
    let caller = env.enter();
    let (result, _) = run_in("y * 2", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Integer(6))));
    assert!(env.local_bindings().is_empty());
    env.leave(caller);
}

#[test]
fn test_function_call() {
    evaluates_to("function f(a){a+1}; f(5)", Value::Integer(6));
    evaluates_to("f = function(a, b){a * b}; f(3, 4)", Value::Integer(12));
    evaluates_to("function f(){1; 2}; f()", Value::Integer(2));
    evaluates_to("function f(){}; f()", Value::Null);
    evaluates_to("function f(){return}; f()", Value::Null);
    evaluates_to(
        "function adder(){function(a, b){a + b}}; adder()(2, 3)",
        Value::Integer(5),
    );
}

#[test]
fn test_function_locals_do_not_leak() {
    let mut env = Environment::new();
    let (result, _) = run_in("x=5; function f(a){x=a; x}; f(1)", &mut env);
    assert_eq!(result, Ok(Flow::Value(Value::Integer(1))));
    assert_eq!(env.local("x"), Some(&Value::Integer(5)));
    assert_eq!(env.local("a"), None);
    assert_eq!(env.current(), ScopeId::ROOT);
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_names_resolve_at_the_call_site() {
    evaluates_to("function g(){y}; function f(y){g()}; f(7)", Value::Integer(7));
    let mut env = Environment::new();
    let (result, _) = run_in("function g(){y}; g()", &mut env);
    assert_eq!(result, Err(Error::UnknownIdentifier("y".to_string())));
    assert_eq!(env.current(), ScopeId::ROOT);
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_return_propagation() {
    evaluates_to(
        "function f(n){ while(1) { if(n > 2) { return n }; n = n + 1 } }; f(0)",
        Value::Integer(3),
    );
    evaluates_to(
        "function fact(n){ if(n <= 1) { return 1 }; return n * fact(n - 1) }; fact(5)",
        Value::Integer(120),
    );
    evaluates_to("function f(){ return 1; 2 }; f() + 1", Value::Integer(2));

    let mut env = Environment::new();
    let (result, _) = run_in("return 5; x = 1", &mut env);
    assert_eq!(result, Ok(Flow::Return(Value::Integer(5))));
    assert_eq!(env.local("x"), None);
}

#[test]
fn test_call_errors() {
    assert_raises(
        "function f(a, b){a}; f(1)",
        Error::ArgumentCount {
            expected: 2,
            found: 1,
        },
    );
    assert_raises("x = 1; x(2)", Error::Type("integer is not callable".to_string()));
    assert_raises("g()", Error::UnknownIdentifier("g".to_string()));
}

const COUNTDOWN: &str =
    "function f(n){ if(n > 0) { return 1 + f(n - 1) }; return 0 }";

#[test]
fn test_recursion_up_to_the_default_limit() {
    let depth = MAX_CALL_DEPTH - 1;
    evaluates_to(&format!("{COUNTDOWN}; f({depth})"), Value::Integer(depth as i64));

    let mut env = Environment::new();
    let (result, _) = run_in(&format!("{COUNTDOWN}; f({MAX_CALL_DEPTH})"), &mut env);
    assert_eq!(result, Err(Error::RecursionLimit(MAX_CALL_DEPTH)));
    assert_eq!(env.current(), ScopeId::ROOT);
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_recursion_limit() {
    let tree = parse_program("function f(n){f(n+1)}; f(0)");
    let mut env = Environment::new();
    let mut out = Vec::new();
    let result = Evaluator::new(&mut out)
        .with_call_limit(10)
        .evaluate(&tree, &mut env);
    assert_eq!(result, Err(Error::RecursionLimit(10)));
    assert_eq!(env.current(), ScopeId::ROOT);
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_indexing() {
    evaluates_to("x = [1, [2, 3]]; x[1][0]", Value::Integer(2));
    evaluates_to("m = {\"a\": 1, \"b\": [4]}; m[\"b\"][0]", Value::Integer(4));
    evaluates_to("x = [1]; x[]", list(&[1]));
    evaluates_to("[1, 2][1.0]", Value::Integer(2));
    evaluates_to("\"abc\"[1]", Value::Text("b".to_string()));
    evaluates_to("i = 1; [5, 6][i]", Value::Integer(6));
}

#[test]
fn test_indexing_errors() {
    assert_raises(
        "[1, 2][2]",
        Error::IndexOutOfRange {
            index: 2,
            length: 2,
        },
    );
    assert_raises(
        "[1, 2][-1]",
        Error::IndexOutOfRange {
            index: -1,
            length: 2,
        },
    );
    assert_raises("m = {\"a\": 1}; m[\"b\"]", Error::KeyNotFound("b".to_string()));
    for input in ["[1, 2][0.5]", "5[0]", "[1][\"a\"]", "[1][null]"] {
        assert_type_error(input);
    }
}

#[test]
fn test_logical_operators_return_operands() {
    evaluates_to("0 || 5", Value::Integer(5));
    evaluates_to("2 && 3", Value::Integer(3));
    evaluates_to("0 && 1", Value::Integer(0));
    evaluates_to("\"\" || null", Value::Null);
    evaluates_to("!0", Value::Boolean(true));
    evaluates_to("![1]", Value::Boolean(false));
}

#[test]
fn test_logical_operators_evaluate_both_sides() {
    assert_raises("0 && y", Error::UnknownIdentifier("y".to_string()));
    assert_raises("1 || y", Error::UnknownIdentifier("y".to_string()));
    assert_eq!(prints("function p(v){print v; v}; p(0) && p(1)"), "0\n1\n");
}

#[test]
fn test_integer_float_equality_is_exact() {
    evaluates_to("9007199254740992 == 9007199254740992.0", Value::Boolean(true));
    evaluates_to("9007199254740993 == 9007199254740992.0", Value::Boolean(false));
    evaluates_to("9007199254740993 != 9007199254740992.0", Value::Boolean(true));
    assert!(!Value::Integer(i64::MAX).loosely_equals(&Value::Float(9223372036854775808.0)));
    assert!(Value::Integer(i64::MIN).loosely_equals(&Value::Float(-9223372036854775808.0)));
    assert!(!Value::Integer(0).loosely_equals(&Value::Float(f64::NAN)));
    assert!(!Value::Integer(1).loosely_equals(&Value::Float(1.5)));
}

#[test]
fn test_comparison_and_equality() {
    evaluates_to("1 == 1.0", Value::Boolean(true));
    evaluates_to("1 != 2", Value::Boolean(true));
    evaluates_to("\"a\" == \"a\"", Value::Boolean(true));
    evaluates_to("[1, 2] == [1, 2.0]", Value::Boolean(true));
    evaluates_to("null == null", Value::Boolean(true));
    evaluates_to("null == 0", Value::Boolean(false));
    evaluates_to("\"a\" < \"b\"", Value::Boolean(true));
    evaluates_to("2 >= 2.5", Value::Boolean(false));
    evaluates_to("3 > 2", Value::Boolean(true));
    assert_type_error("1 < \"a\"");
}

#[test]
fn test_concatenation() {
    evaluates_to("\"ab\" + \"cd\"", Value::Text("abcd".to_string()));
    evaluates_to("[1] + [2, 3]", list(&[1, 2, 3]));
    assert_raises(
        "\"a\" + 1",
        Error::Type("unsupported operand types for +: text and integer".to_string()),
    );
}

#[test]
fn test_negation() {
    evaluates_to("-(1.5)", Value::Float(-1.5));
    evaluates_to("--3", Value::Integer(3));
    assert_raises(
        "-\"a\"",
        Error::Type("bad operand type for negation: text".to_string()),
    );
}

#[test]
fn test_unknown_operator() {
    let tree = Node::BinaryOp(
        Operator::Not,
        Box::new((Node::Number(Number::Integer(1)), Node::Number(Number::Integer(2)))),
    );
    let mut env = Environment::new();
    let mut out = Vec::new();
    let result = Evaluator::new(&mut out).evaluate(&tree, &mut env);
    assert_eq!(result, Err(Error::UnknownOperator(Operator::Not)));

    let tree = Node::UnaryOp(Operator::Plus, Box::new(Node::Number(Number::Integer(1))));
    let result = Evaluator::new(&mut out).evaluate(&tree, &mut env);
    assert_eq!(result, Err(Error::UnknownOperator(Operator::Plus)));
}

#[test]
fn test_flow_accessors() {
    let flow = Flow::Return(Value::Integer(1));
    assert!(flow.is_return());
    assert_eq!(flow.value(), &Value::Integer(1));
    assert_eq!(flow.into_value(), Value::Integer(1));
    assert!(!Flow::Value(Value::Null).is_return());
}
