use super::error::Error;
use const_format::concatcp;
use regex::Regex;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub(crate) typ: TokenType,
    pub(crate) lexeme: String,
    pub(crate) value: Literal,
    pub(crate) position: usize,
}

impl Token {
    pub fn typ(&self) -> TokenType {
        self.typ
    }
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }
    pub fn value(&self) -> &Literal {
        &self.value
    }
    pub fn position(&self) -> usize {
        self.position
    }
    pub fn is_end(&self) -> bool {
        self.typ == TokenType::ENDMARKER
    }
    fn endmarker(position: usize) -> Self {
        Self {
            typ: TokenType::ENDMARKER,
            lexeme: String::new(),
            value: Literal::None,
            position,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}('{}')@{}", self.typ, self.lexeme, self.position)
    }
}

/// Decoded payload of a token. Only numbers, strings and names carry one.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Text(String),
    None,
}

#[allow(non_camel_case_types)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenType {
    ENDMARKER,
    WHITESPACE,
    NAME,
    NUMBER,
    STRING,
    KEYWORD,
    LPAR,
    RPAR,
    LSQB,
    RSQB,
    LBRACE,
    RBRACE,
    COMMA,
    SEMI,
    COLON,
    EQEQUAL,
    NOTEQUAL,
    LESSEQUAL,
    GREATEREQUAL,
    DOUBLEAMPER,
    DOUBLEVBAR,
    LESS,
    GREATER,
    EQUAL,
    EXCLAMATION,
    PLUS,
    MINUS,
    STAR,
    SLASH,
}

macro_rules! alternative {
    ($t:expr) => {{
        $t
    }};
    ($t:expr, $($ts:expr),+) => {{
        concatcp!($t, "|", alternative!($($ts),+))
    }}
}

macro_rules! group {
    ($($ts:expr),+) => {{
        concatcp!(r"(?:", alternative!($($ts),+), ")")
    }}
}

const S_WHITESPACE: &str = r"\s+";
const S_POINTFLOAT: &str = r"[0-9]+\.[0-9]*";
const S_LEADINGPOINT: &str = r"\.[0-9]+";
const S_DECNUMBER: &str = r"[0-9]+";
const S_NUMBER: &str = group!(S_POINTFLOAT, S_LEADINGPOINT, S_DECNUMBER);
const S_STRING: &str = r#""(?:[^"\\]|\\.)*""#;
const S_NAME: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const S_KEYWORDS: &str = concatcp!(
    group!("print", "if", "else", "while", "function", "return", "true", "false", "null"),
    r"\b"
);

// Tried in order; the first rule matching at the current position wins.
// Two-character operators must precede their one-character prefixes and
// keywords must precede NAME.
const RULES: [(&str, TokenType); 28] = [
    (S_WHITESPACE, TokenType::WHITESPACE),
    (r"\(", TokenType::LPAR),
    (r"\)", TokenType::RPAR),
    (r"\[", TokenType::LSQB),
    (r"\]", TokenType::RSQB),
    (r"\{", TokenType::LBRACE),
    (r"\}", TokenType::RBRACE),
    (",", TokenType::COMMA),
    (";", TokenType::SEMI),
    (":", TokenType::COLON),
    ("==", TokenType::EQEQUAL),
    ("!=", TokenType::NOTEQUAL),
    ("<=", TokenType::LESSEQUAL),
    (">=", TokenType::GREATEREQUAL),
    ("&&", TokenType::DOUBLEAMPER),
    (r"\|\|", TokenType::DOUBLEVBAR),
    ("<", TokenType::LESS),
    (">", TokenType::GREATER),
    ("=", TokenType::EQUAL),
    ("!", TokenType::EXCLAMATION),
    (r"\+", TokenType::PLUS),
    ("-", TokenType::MINUS),
    (r"\*", TokenType::STAR),
    ("/", TokenType::SLASH),
    (S_KEYWORDS, TokenType::KEYWORD),
    (S_NUMBER, TokenType::NUMBER),
    (S_STRING, TokenType::STRING),
    (S_NAME, TokenType::NAME),
];

pub struct Tokenizer {
    rules: Vec<(Regex, TokenType)>,
}

impl Tokenizer {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|(pattern, typ)| Regex::new(&Self::anchored(pattern)).map(|regex| (regex, *typ)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    fn anchored(pattern: &str) -> String {
        format!("^(?:{pattern})")
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, Error> {
        let mut tokens = vec![];
        let mut position = 0;
        while position < text.len() {
            let rest = &text[position..];
            let (m, typ) = self
                .rules
                .iter()
                .find_map(|(regex, typ)| regex.find(rest).map(|m| (m, *typ)))
                .ok_or(Error::Tokenize { position })?;
            let lexeme = m.as_str();
            if typ != TokenType::WHITESPACE {
                tokens.push(Token {
                    typ,
                    lexeme: lexeme.to_string(),
                    value: decode(typ, lexeme, position)?,
                    position,
                });
            }
            position += m.end();
        }
        tokens.push(Token::endmarker(text.len()));
        tracing::trace!(count = tokens.len(), "tokenized input");
        Ok(tokens)
    }
}

fn decode(typ: TokenType, lexeme: &str, position: usize) -> Result<Literal, Error> {
    let literal = match typ {
        TokenType::NUMBER if lexeme.contains('.') => {
            Literal::Float(lexeme.parse().map_err(|_| Error::InvalidNumber {
                lexeme: lexeme.to_string(),
                position,
            })?)
        }
        TokenType::NUMBER => Literal::Integer(lexeme.parse().map_err(|_| Error::InvalidNumber {
            lexeme: lexeme.to_string(),
            position,
        })?),
        TokenType::STRING => Literal::Text(unescape(&lexeme[1..lexeme.len() - 1])),
        TokenType::NAME => Literal::Text(lexeme.to_string()),
        _ => Literal::None,
    };
    Ok(literal)
}

fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(chr) = chars.next() {
        if chr != '\\' {
            result.push(chr);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// One-shot tokenization. Callers tokenizing many inputs should build a
/// [`Tokenizer`] once and reuse it.
pub fn tokenize_string(text: &str) -> Result<Vec<Token>, Error> {
    let tokenizer = Tokenizer::new().map_err(|e| Error::Rules(e.to_string()))?;
    tokenizer.tokenize(text)
}
