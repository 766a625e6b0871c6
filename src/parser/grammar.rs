// # ========================= START OF THE GRAMMAR =========================
//
// # Every rule takes the remaining tokens and returns the node it built
// # together with the tokens left after it. Rules fail fast: the first missing
// # delimiter aborts the parse with an error naming what was expected.
//
// # Rules are listed from the loosest binding to the tightest:
//
// program: statement_list
// statement_list: [statement (';' statement)* ';'*]
// statement:
//     | print_statement
//     | if_statement
//     | while_statement
//     | return_statement
//     | function_statement
//     | block
//     | assignment_statement
// expression: boolean_expression
// boolean_expression: boolean_term ('||' boolean_term)*
// boolean_term: comparison_expression ('&&' comparison_expression)*
// comparison_expression: arithmetic_expression [('==' | '!=' | '<' | '>' | '<=' | '>=') arithmetic_expression]
// arithmetic_expression: term (('+' | '-') term)*
// term: factor (('*' | '/') factor)*
// factor: simple_expression
// simple_expression: ('-' | '!') simple_expression | primary postfix*

use std::rc::Rc;

use super::ast::*;
use super::combinators::*;
use super::error::Error;
use super::tokenizer::{Literal, Token, TokenType as TT};
use crate::stack::ensure_sufficient_stack;

/// Deepest nesting of brackets, prefix operators or same-level binary
/// operators a program may use.
pub const MAX_NESTING: usize = 200;

pub fn parse(input: &[Token]) -> Result<Node, Error> {
    check_nesting(input)?;
    let (tree, rest) = program(input)?;
    if !at(rest, TT::ENDMARKER) {
        return Err(unexpected(rest, "end of input"));
    }
    if let Node::Program(statements) = &tree {
        tracing::trace!(statements = statements.len(), "parsed program");
    }
    Ok(tree)
}

fn too_deep(token: &Token) -> Error {
    Error::Parse {
        expected: "shallower nesting".to_string(),
        found: format!("'{}'", token.lexeme),
        position: token.position,
    }
}

// Open brackets and runs of prefix operators each add a level. Measured on
// the tokens so that no rule recurses past the bound.
fn check_nesting(input: &[Token]) -> Result<(), Error> {
    let mut depth = 0usize;
    let mut prefix_run = 0usize;
    for token in input {
        match token.typ {
            TT::LPAR | TT::LSQB | TT::LBRACE => depth += 1,
            TT::RPAR | TT::RSQB | TT::RBRACE => depth = depth.saturating_sub(1),
            _ => {}
        }
        prefix_run = match token.typ {
            TT::MINUS | TT::EXCLAMATION => prefix_run + 1,
            _ => 0,
        };
        if depth + prefix_run > MAX_NESTING {
            return Err(too_deep(token));
        }
    }
    Ok(())
}

// # STARTING RULES
// # ==============

// program: statement_list
fn program(input: &[Token]) -> ParseResult<'_, Node> {
    let (statements, rest) = statement_list(input)?;
    Ok((Node::Program(statements), rest))
}

// statement_list: [statement (';' statement)* ';'*]
fn statement_list(input: &[Token]) -> ParseResult<'_, Vec<Node>> {
    let mut statements = vec![];
    let mut rest = input;
    while !at(rest, TT::ENDMARKER) && !at(rest, TT::RBRACE) {
        let (statement, after) = statement(rest)?;
        statements.push(statement);
        let (separated, mut after) = maybe(after, TT::SEMI);
        while let (true, more) = maybe(after, TT::SEMI) {
            after = more;
        }
        rest = after;
        if !separated {
            break;
        }
    }
    Ok((statements, rest))
}

// # STATEMENTS
// # ==========

fn statement(input: &[Token]) -> ParseResult<'_, Node> {
    ensure_sufficient_stack(|| statement_inner(input))
}

fn statement_inner(input: &[Token]) -> ParseResult<'_, Node> {
    if at_keyword(input, "print") {
        return print_statement(input);
    }
    if at_keyword(input, "if") {
        return if_statement(input);
    }
    if at_keyword(input, "while") {
        return while_statement(input);
    }
    if at_keyword(input, "return") {
        return return_statement(input);
    }
    if at_keyword(input, "function") && input.get(1).is_some_and(|t| t.typ == TT::NAME) {
        return function_statement(input);
    }
    if at(input, TT::LBRACE) {
        return block(input);
    }
    assignment_statement(input)
}

fn ends_statement(input: &[Token]) -> bool {
    at(input, TT::SEMI) || at(input, TT::RBRACE) || at(input, TT::ENDMARKER)
}

// print_statement: 'print' ['(' ')' | expression]
fn print_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = keyword(input, "print")?;
    if at(rest, TT::LPAR) && rest.get(1).is_some_and(|t| t.typ == TT::RPAR) {
        return Ok((Node::Print(None), &rest[2..]));
    }
    if ends_statement(rest) {
        return Ok((Node::Print(None), rest));
    }
    let (value, rest) = expression(rest)?;
    Ok((Node::Print(Some(Box::new(value))), rest))
}

// if_statement: 'if' '(' expression ')' statement ['else' statement]
fn if_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = keyword(input, "if")?;
    let (condition, rest) = parenthesized(rest)?;
    let (then, rest) = statement(rest)?;
    if !at_keyword(rest, "else") {
        return Ok((Node::If(Box::new(condition), Box::new(then), None), rest));
    }
    let (_, rest) = keyword(rest, "else")?;
    let (otherwise, rest) = statement(rest)?;
    Ok((
        Node::If(Box::new(condition), Box::new(then), Some(Box::new(otherwise))),
        rest,
    ))
}

// while_statement: 'while' '(' expression ')' statement
fn while_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = keyword(input, "while")?;
    let (condition, rest) = parenthesized(rest)?;
    let (body, rest) = statement(rest)?;
    Ok((Node::While(Box::new(condition), Box::new(body)), rest))
}

// return_statement: 'return' [expression]
fn return_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = keyword(input, "return")?;
    if ends_statement(rest) {
        return Ok((Node::Return(None), rest));
    }
    let (value, rest) = expression(rest)?;
    Ok((Node::Return(Some(Box::new(value))), rest))
}

// function_statement: 'function' NAME function_tail
fn function_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = keyword(input, "function")?;
    let (name, rest) = identifier(rest)?;
    let (function, rest) = function_tail(rest)?;
    Ok((Node::Assign(name, Box::new(function)), rest))
}

// function_tail: '(' [NAME (',' NAME)*] ')' block
fn function_tail(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = tok(input, TT::LPAR)?;
    let (parameters, rest) = sep_by(rest, identifier, TT::COMMA, TT::RPAR)?;
    let (body, rest) = block(rest)?;
    Ok((Node::Function(Rc::new(Function { parameters, body })), rest))
}

// block: '{' statement_list '}'
fn block(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = tok(input, TT::LBRACE)?;
    let (statements, rest) = statement_list(rest)?;
    let (_, rest) = tok(rest, TT::RBRACE)?;
    Ok((Node::Block(statements), rest))
}

// # NOTE: an assignment starts out as an ordinary expression; only the '='
// # after it turns the expression into a target, which must be a name.
// assignment_statement: expression ['=' expression]
fn assignment_statement(input: &[Token]) -> ParseResult<'_, Node> {
    let (target, rest) = expression(input)?;
    if !at(rest, TT::EQUAL) {
        return Ok((target, rest));
    }
    let Node::Identifier(name) = target else {
        return Err(Error::Parse {
            expected: "identifier as assignment target".to_string(),
            found: "'='".to_string(),
            position: rest[0].position,
        });
    };
    let (_, rest) = tok(rest, TT::EQUAL)?;
    let (value, rest) = expression(rest)?;
    Ok((Node::Assign(name, Box::new(value)), rest))
}

// # EXPRESSIONS
// # ===========

// expression: boolean_expression
fn expression(input: &[Token]) -> ParseResult<'_, Node> {
    ensure_sufficient_stack(|| boolean_expression(input))
}

// Folds `next (op next)*` into a left-leaning tree.
fn left_associative<'a>(
    input: &'a [Token],
    next: fn(&'a [Token]) -> ParseResult<'a, Node>,
    operators: &[TT],
) -> ParseResult<'a, Node> {
    let (mut node, mut rest) = next(input)?;
    let mut operands = 1;
    while let Some((token, after)) = rest.split_first() {
        if !operators.contains(&token.typ) {
            break;
        }
        operands += 1;
        if operands > MAX_NESTING {
            return Err(too_deep(token));
        }
        let op = Operator::try_from(token).map_err(|_| unexpected(rest, "operator"))?;
        let (right, after) = next(after)?;
        node = Node::binary(op, node, right);
        rest = after;
    }
    Ok((node, rest))
}

// boolean_expression: boolean_term ('||' boolean_term)*
fn boolean_expression(input: &[Token]) -> ParseResult<'_, Node> {
    left_associative(input, boolean_term, &[TT::DOUBLEVBAR])
}

// boolean_term: comparison_expression ('&&' comparison_expression)*
fn boolean_term(input: &[Token]) -> ParseResult<'_, Node> {
    left_associative(input, comparison_expression, &[TT::DOUBLEAMPER])
}

const COMPARISONS: [TT; 6] = [
    TT::EQEQUAL,
    TT::NOTEQUAL,
    TT::LESS,
    TT::GREATER,
    TT::LESSEQUAL,
    TT::GREATEREQUAL,
];

// # Comparisons do not chain: `a < b < c` stops after `a < b`.
// comparison_expression: arithmetic_expression [COMPARISON arithmetic_expression]
fn comparison_expression(input: &[Token]) -> ParseResult<'_, Node> {
    let (left, rest) = arithmetic_expression(input)?;
    match rest.split_first() {
        Some((token, after)) if COMPARISONS.contains(&token.typ) => {
            let op = Operator::try_from(token).map_err(|_| unexpected(rest, "comparison"))?;
            let (right, after) = arithmetic_expression(after)?;
            Ok((Node::binary(op, left, right), after))
        }
        _ => Ok((left, rest)),
    }
}

// arithmetic_expression: term (('+' | '-') term)*
fn arithmetic_expression(input: &[Token]) -> ParseResult<'_, Node> {
    left_associative(input, term, &[TT::PLUS, TT::MINUS])
}

// term: factor (('*' | '/') factor)*
fn term(input: &[Token]) -> ParseResult<'_, Node> {
    left_associative(input, factor, &[TT::STAR, TT::SLASH])
}

// factor: simple_expression
fn factor(input: &[Token]) -> ParseResult<'_, Node> {
    simple_expression(input)
}

// simple_expression:
//     | '-' simple_expression
//     | '!' simple_expression
//     | primary postfix*
fn simple_expression(input: &[Token]) -> ParseResult<'_, Node> {
    if let (true, rest) = maybe(input, TT::MINUS) {
        let (operand, rest) = simple_expression(rest)?;
        return Ok((Node::unary(Operator::Negate, operand), rest));
    }
    if let (true, rest) = maybe(input, TT::EXCLAMATION) {
        let (operand, rest) = simple_expression(rest)?;
        return Ok((Node::unary(Operator::Not, operand), rest));
    }
    let (node, rest) = primary(input)?;
    postfix(node, rest)
}

// primary:
//     | NUMBER
//     | STRING
//     | 'true' | 'false' | 'null'
//     | 'function' function_tail
//     | NAME
//     | '(' expression ')'
//     | '[' [expression (',' expression)*] ']'
//     | '{' [STRING ':' expression (',' STRING ':' expression)*] '}'
fn primary(input: &[Token]) -> ParseResult<'_, Node> {
    let Some((token, rest)) = input.split_first() else {
        return Err(unexpected(input, "expression"));
    };
    match (token.typ, &token.value) {
        (TT::NUMBER, Literal::Integer(i)) => Ok((Node::Number(Number::Integer(*i)), rest)),
        (TT::NUMBER, Literal::Float(x)) => Ok((Node::Number(Number::Float(*x)), rest)),
        (TT::STRING, Literal::Text(s)) => Ok((Node::StringLiteral(s.clone()), rest)),
        (TT::NAME, _) => identifier(input).map(|(name, rest)| (Node::Identifier(name), rest)),
        (TT::KEYWORD, _) => match token.lexeme.as_str() {
            "true" => Ok((Node::Boolean(true), rest)),
            "false" => Ok((Node::Boolean(false), rest)),
            "null" => Ok((Node::Null, rest)),
            "function" => function_tail(rest),
            _ => Err(unexpected(input, "expression")),
        },
        (TT::LPAR, _) => parenthesized(input),
        (TT::LSQB, _) => {
            let (elements, rest) = sep_by(rest, expression, TT::COMMA, TT::RSQB)?;
            Ok((Node::List(elements), rest))
        }
        (TT::LBRACE, _) => {
            let (entries, rest) = sep_by(rest, map_entry, TT::COMMA, TT::RBRACE)?;
            Ok((Node::Map(entries), rest))
        }
        _ => Err(unexpected(input, "expression")),
    }
}

// postfix: '(' [expression (',' expression)*] ')' | '[' [expression] ']'
fn postfix(mut node: Node, input: &[Token]) -> ParseResult<'_, Node> {
    let mut rest = input;
    loop {
        if let (true, after) = maybe(rest, TT::LPAR) {
            let (arguments, after) = sep_by(after, expression, TT::COMMA, TT::RPAR)?;
            node = Node::Call(Box::new(node), arguments);
            rest = after;
        } else if let (true, after) = maybe(rest, TT::LSQB) {
            if let (true, after) = maybe(after, TT::RSQB) {
                node = Node::Index(Box::new(node), None);
                rest = after;
                continue;
            }
            let (index, after) = expression(after)?;
            let (_, after) = tok(after, TT::RSQB)?;
            node = Node::Index(Box::new(node), Some(Box::new(index)));
            rest = after;
        } else {
            return Ok((node, rest));
        }
    }
}

// map_entry: STRING ':' expression
fn map_entry(input: &[Token]) -> ParseResult<'_, (String, Node)> {
    let (key, rest) = tok(input, TT::STRING)?;
    let Literal::Text(key) = &key.value else {
        return Err(unexpected(input, "string key"));
    };
    let (_, rest) = tok(rest, TT::COLON)?;
    let (value, rest) = expression(rest)?;
    Ok(((key.clone(), value), rest))
}

// '(' expression ')'
fn parenthesized(input: &[Token]) -> ParseResult<'_, Node> {
    let (_, rest) = tok(input, TT::LPAR)?;
    let (node, rest) = expression(rest)?;
    let (_, rest) = tok(rest, TT::RPAR)?;
    Ok((node, rest))
}

fn identifier(input: &[Token]) -> ParseResult<'_, Name> {
    let (token, rest) = tok(input, TT::NAME)?;
    let name = Name::try_from(token).map_err(|_| unexpected(input, "identifier"))?;
    Ok((name, rest))
}
