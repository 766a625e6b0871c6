use super::error::Error;
use super::tokenizer::{Token, TokenType};

/// A parsed value together with the tokens left after it.
pub type ParseResult<'a, Output> = Result<(Output, &'a [Token]), Error>;

pub(super) fn describe(token: &TokenType) -> &'static str {
    match token {
        TokenType::ENDMARKER => "end of input",
        TokenType::WHITESPACE => "whitespace",
        TokenType::NAME => "identifier",
        TokenType::NUMBER => "number",
        TokenType::STRING => "string",
        TokenType::KEYWORD => "keyword",
        TokenType::LPAR => "'('",
        TokenType::RPAR => "')'",
        TokenType::LSQB => "'['",
        TokenType::RSQB => "']'",
        TokenType::LBRACE => "'{'",
        TokenType::RBRACE => "'}'",
        TokenType::COMMA => "','",
        TokenType::SEMI => "';'",
        TokenType::COLON => "':'",
        TokenType::EQEQUAL => "'=='",
        TokenType::NOTEQUAL => "'!='",
        TokenType::LESSEQUAL => "'<='",
        TokenType::GREATEREQUAL => "'>='",
        TokenType::DOUBLEAMPER => "'&&'",
        TokenType::DOUBLEVBAR => "'||'",
        TokenType::LESS => "'<'",
        TokenType::GREATER => "'>'",
        TokenType::EQUAL => "'='",
        TokenType::EXCLAMATION => "'!'",
        TokenType::PLUS => "'+'",
        TokenType::MINUS => "'-'",
        TokenType::STAR => "'*'",
        TokenType::SLASH => "'/'",
    }
}

/// The token at the front of `input`. Every stream ends in an ENDMARKER, so
/// an empty slice can only come from a caller that sliced past it.
pub(super) fn peek(input: &[Token]) -> Option<&Token> {
    input.first()
}

pub(super) fn at(input: &[Token], expected_type: TokenType) -> bool {
    matches!(peek(input), Some(token) if token.typ == expected_type)
}

pub(super) fn at_keyword(input: &[Token], expected_lexeme: &str) -> bool {
    matches!(peek(input), Some(token) if token.typ == TokenType::KEYWORD && token.lexeme == expected_lexeme)
}

pub(super) fn unexpected(input: &[Token], expected: &str) -> Error {
    match peek(input) {
        Some(token) => Error::Parse {
            expected: expected.to_string(),
            found: if token.typ == TokenType::ENDMARKER {
                describe(&token.typ).to_string()
            } else {
                format!("'{}'", token.lexeme)
            },
            position: token.position,
        },
        None => Error::Parse {
            expected: expected.to_string(),
            found: describe(&TokenType::ENDMARKER).to_string(),
            position: 0,
        },
    }
}

/// Consumes a token of the given type or fails naming what was expected.
pub(super) fn tok(input: &[Token], expected_type: TokenType) -> ParseResult<'_, &Token> {
    match input.split_first() {
        Some((token, rest)) if token.typ == expected_type => Ok((token, rest)),
        _ => Err(unexpected(input, describe(&expected_type))),
    }
}

pub(super) fn keyword<'a>(input: &'a [Token], expected_lexeme: &str) -> ParseResult<'a, ()> {
    match input.split_first() {
        Some((token, rest))
            if token.typ == TokenType::KEYWORD && token.lexeme == expected_lexeme =>
        {
            Ok(((), rest))
        }
        _ => Err(unexpected(input, &format!("'{expected_lexeme}'"))),
    }
}

/// Consumes the token if present, leaving the input untouched otherwise.
pub(super) fn maybe(input: &[Token], expected_type: TokenType) -> (bool, &[Token]) {
    match tok(input, expected_type) {
        Ok((_, rest)) => (true, rest),
        Err(_) => (false, input),
    }
}

/// Parses `item (sep item)*` up to, and including, the `close` token. The
/// list may be empty.
pub(super) fn sep_by<'a, R>(
    input: &'a [Token],
    item: impl Fn(&'a [Token]) -> ParseResult<'a, R>,
    sep: TokenType,
    close: TokenType,
) -> ParseResult<'a, Vec<R>> {
    let mut result = Vec::new();
    let mut rest = input;
    if let (true, after) = maybe(rest, close) {
        return Ok((result, after));
    }
    loop {
        let (next, after) = item(rest)?;
        result.push(next);
        rest = after;
        if let (true, after) = maybe(rest, sep) {
            rest = after;
            continue;
        }
        let (_, after) = tok(rest, close)
            .map_err(|_| unexpected(rest, &format!("{} or {}", describe(&sep), describe(&close))))?;
        return Ok((result, after));
    }
}
