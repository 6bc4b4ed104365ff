use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use thiserror::Error;

use tools::errors::{CodeErr, ErrorKind, ReportCodeErr};
use tools::position::{Position, Span};

#[derive(Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("Found unexpected '{0}'")]
    UnrecognizedToken(char),

    #[error("Expected '=' (after '!' as '!=')")]
    ExpectedEqualAfterBang,

    #[error("Mismatched `'` in string literal")]
    UnterminatedString,
}

impl ReportCodeErr for LexerError {
    fn kind(&self) -> ErrorKind {
        match self {
            LexerError::UnrecognizedToken(_) => ErrorKind::IllegalCharacter,
            _ => ErrorKind::Syntax,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literal types
    Int,
    Float,
    String,
    Identifier,

    // Operators
    Equals,
    BinaryOperator, // + - * / ^
    Comparison,     // == != < > <= >=
    SimpleArrow,

    // Grouping
    OpenParen,    // (
    CloseParen,   // )
    OpenBrace,    // {
    CloseBrace,   // }
    OpenBracket,  // [
    CloseBracket, // ]
    Comma,        // ,
    Colon,        // :
    Dot,          // .

    // Keywords
    Var,
    And,
    Or,
    Not,
    If,
    Elif,
    Then,
    Else,
    For,
    While,
    Step,
    To,
    Function,
    End,
    Return,
    Continue,
    Break,
    In,
    New,
    Nonlocal,
    Defer,

    // File
    EndLine,
    EOF,
}

// Value keeps the source text, or the unescaped content for strings
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }

    pub fn start(&self) -> &Position {
        &self.span.start
    }

    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self.kind, TokenKind::BinaryOperator | TokenKind::Comparison) && self.value == op
    }
}

// Skip listed char
fn is_skippable(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

fn is_statement_separator(c: char) -> bool {
    matches!(c, '\n' | ';')
}

fn escaped_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'b' => '\u{8}',
        'r' => '\r',
        other => other,
    }
}

// Walks the source one code point at a time, keeping the position up to date
struct Scanner<'c> {
    chars: &'c [char],
    idx: usize,
    pos: Position,
}

impl<'c> Scanner<'c> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.idx + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        self.pos.advance(c);

        Some(c)
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.pos.clone())
    }
}

pub struct Lexer<'a> {
    pub tokens: VecDeque<Token>,
    reserved_keywords: HashMap<&'a str, TokenKind>,
    filename: Rc<str>,
}

impl<'a> Default for Lexer<'a> {
    fn default() -> Self {
        Self::new("<stdin>")
    }
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &str) -> Self {
        let mut lexer = Self {
            tokens: VecDeque::new(),
            reserved_keywords: HashMap::new(),
            filename: Rc::from(filename),
        };
        lexer.generate_keywords();

        lexer
    }

    // Keywords generation
    fn generate_keywords(&mut self) {
        let keywords = [
            ("var", TokenKind::Var),
            ("and", TokenKind::And),
            ("or", TokenKind::Or),
            ("not", TokenKind::Not),
            ("if", TokenKind::If),
            ("elif", TokenKind::Elif),
            ("then", TokenKind::Then),
            ("else", TokenKind::Else),
            ("for", TokenKind::For),
            ("while", TokenKind::While),
            ("step", TokenKind::Step),
            ("to", TokenKind::To),
            ("function", TokenKind::Function),
            ("end", TokenKind::End),
            ("return", TokenKind::Return),
            ("continue", TokenKind::Continue),
            ("break", TokenKind::Break),
            ("in", TokenKind::In),
            ("new", TokenKind::New),
            ("nonlocal", TokenKind::Nonlocal),
            ("defer", TokenKind::Defer),
        ];

        for (word, kind) in keywords {
            self.reserved_keywords.insert(word, kind);
        }
    }

    pub fn tokenize(&mut self, source_code: String) -> Result<(), CodeErr> {
        let chars = source_code.chars().collect::<Vec<char>>();
        let mut scanner = Scanner {
            chars: &chars,
            idx: 0,
            pos: Position::new(self.filename.clone()),
        };

        self.tokens.clear();

        while let Some(first_char) = scanner.peek() {
            if is_skippable(first_char) {
                scanner.bump();
                continue;
            }

            let start = scanner.pos.clone();

            match first_char {
                // Comments run to the end of the line, the new line is kept
                '#' => {
                    while let Some(c) = scanner.peek() {
                        if c == '\n' {
                            break;
                        }
                        scanner.bump();
                    }
                }
                c if is_statement_separator(c) => {
                    scanner.bump();
                    let span = scanner.span_from(start);
                    self.tokens.push_back(Token::new(TokenKind::EndLine, "\n", span));
                }
                '+' | '*' | '/' | '^' => {
                    scanner.bump();
                    let span = scanner.span_from(start);
                    self.tokens
                        .push_back(Token::new(TokenKind::BinaryOperator, first_char.to_string(), span));
                }
                '-' => {
                    scanner.bump();
                    // We check for an arrow
                    if scanner.peek() == Some('>') {
                        scanner.bump();
                        let span = scanner.span_from(start);
                        self.tokens.push_back(Token::new(TokenKind::SimpleArrow, "->", span));
                    } else {
                        let span = scanner.span_from(start);
                        self.tokens.push_back(Token::new(TokenKind::BinaryOperator, "-", span));
                    }
                }
                '=' | '<' | '>' => {
                    scanner.bump();
                    let token = if scanner.peek() == Some('=') {
                        scanner.bump();
                        Token::new(
                            TokenKind::Comparison,
                            format!("{}=", first_char),
                            scanner.span_from(start),
                        )
                    } else if first_char == '=' {
                        Token::new(TokenKind::Equals, "=", scanner.span_from(start))
                    } else {
                        Token::new(
                            TokenKind::Comparison,
                            first_char.to_string(),
                            scanner.span_from(start),
                        )
                    };
                    self.tokens.push_back(token);
                }
                '!' => {
                    scanner.bump();
                    if scanner.peek() != Some('=') {
                        return Err(LexerError::ExpectedEqualAfterBang.to_glob_err(&start));
                    }
                    scanner.bump();
                    let span = scanner.span_from(start);
                    self.tokens.push_back(Token::new(TokenKind::Comparison, "!=", span));
                }
                '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | '.' => {
                    scanner.bump();
                    let kind = match first_char {
                        '(' => TokenKind::OpenParen,
                        ')' => TokenKind::CloseParen,
                        '[' => TokenKind::OpenBracket,
                        ']' => TokenKind::CloseBracket,
                        '{' => TokenKind::OpenBrace,
                        '}' => TokenKind::CloseBrace,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        _ => TokenKind::Dot,
                    };
                    let span = scanner.span_from(start);
                    self.tokens.push_back(Token::new(kind, first_char.to_string(), span));
                }
                '\'' => {
                    let token = self.tokenize_string(&mut scanner, start)?;
                    self.tokens.push_back(token);
                }
                c if c.is_ascii_digit() => {
                    let mut val = String::new();
                    let mut decimal = false;

                    while let Some(c) = scanner.peek() {
                        if c.is_ascii_digit() {
                            val.push(c);
                        } else if c == '.' && !decimal {
                            // A second dot ends the number
                            val.push(c);
                            decimal = true;
                        } else {
                            break;
                        }
                        scanner.bump();
                    }

                    let kind = if decimal {
                        TokenKind::Float
                    } else {
                        TokenKind::Int
                    };
                    let span = scanner.span_from(start);
                    self.tokens.push_back(Token::new(kind, val, span));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut val = String::new();

                    while let Some(c) = scanner.peek() {
                        if !c.is_alphanumeric() && c != '_' {
                            break;
                        }
                        val.push(c);
                        scanner.bump();
                    }

                    let span = scanner.span_from(start);
                    // Check for reserved keywords
                    let kind = self
                        .reserved_keywords
                        .get(val.as_str())
                        .copied()
                        .unwrap_or(TokenKind::Identifier);
                    self.tokens.push_back(Token::new(kind, val, span));
                }
                other => {
                    return Err(LexerError::UnrecognizedToken(other).to_glob_err(&start));
                }
            }
        }

        // We append manualy end of file
        let end = scanner.pos.clone();
        self.tokens
            .push_back(Token::new(TokenKind::EOF, "EOF", Span::new(end.clone(), end)));

        Ok(())
    }

    fn tokenize_string(&self, scanner: &mut Scanner, start: Position) -> Result<Token, CodeErr> {
        let mut content = String::new();
        let mut escaped = false;

        // Opening quote
        scanner.bump();

        loop {
            let Some(c) = scanner.bump() else {
                return Err(LexerError::UnterminatedString.to_glob_err(&start));
            };

            if escaped {
                content.push(escaped_char(c));
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                break;
            } else {
                content.push(c);
            }
        }

        Ok(Token::new(TokenKind::String, content, scanner.span_from(start)))
    }
}
