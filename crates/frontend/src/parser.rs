use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

mod collection_parser;
mod control_parser;
mod errors_parser;
mod fn_parser;
mod var_parser;

pub use crate::ast::{ASTNode, BinaryOperator, NodeKind, NumberLiteral, UnaryOperator};
pub use crate::lexer::{Token, TokenKind};
pub use self::errors_parser::ParserError;

use tools::errors::{CodeErr, ReportCodeErr};
use tools::position::{Position, Span};

use self::errors_parser::describe;

// Names collected for the function being parsed
#[derive(Debug, Default)]
pub(crate) struct FunctionScope {
    free_vars: Vec<String>,
    cell_vars: Vec<String>,
}

#[derive(Default)]
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    // One entry per function definition being parsed, innermost last
    scopes: Vec<FunctionScope>,
}

impl Parser {
    pub fn build_ast(&mut self, tokens: VecDeque<Token>) -> Result<ASTNode, CodeErr> {
        self.tokens = tokens.into();
        self.cursor = 0;
        self.scopes.clear();

        // The token stream is always closed by an EOF
        if self.tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let end = self
                .tokens
                .last()
                .map(|t| t.span.end.clone())
                .unwrap_or_default();
            self.tokens
                .push(Token::new(TokenKind::EOF, "EOF", Span::new(end.clone(), end)));
        }

        let program = self
            .parse_program()
            .map_err(|e| e.to_glob_err(self.at().start()))?;

        debug!(tokens = self.tokens.len(), "program parsed");

        Ok(program)
    }

    fn parse_program(&mut self) -> Result<ASTNode, ParserError> {
        self.skip_end_lines();

        // Empty program
        if self.is_eof() {
            let span = self.at().span.clone();
            return Ok(ASTNode::new(NodeKind::Block { statements: vec![] }, span));
        }

        let program = self.parse_statements()?;

        if !self.is_eof() {
            return Err(ParserError::UnexpectedEndOfInput);
        }

        Ok(program)
    }

    // Statements separated by at least one new line. The block ends on the first
    // statement that can't even start, leaving that token to the caller
    pub(crate) fn parse_statements(&mut self) -> Result<ASTNode, ParserError> {
        self.skip_end_lines();

        let start = self.at().start().clone();
        let mut statements = vec![self.parse_statement()?];

        loop {
            let separators = self.skip_end_lines();
            if separators == 0 {
                break;
            }

            if matches!(
                self.at().kind,
                TokenKind::End | TokenKind::Elif | TokenKind::Else | TokenKind::EOF
            ) {
                break;
            }

            match self.attempt(|p| p.parse_statement())? {
                Some(stmt) => statements.push(stmt),
                None => break,
            }
        }

        Ok(ASTNode::new(
            NodeKind::Block { statements },
            self.span_from(&start),
        ))
    }

    pub(crate) fn parse_statement(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();

        match self.at().kind {
            TokenKind::Return => {
                if self.scopes.is_empty() {
                    return Err(ParserError::OutsideFunction("return".into()));
                }
                self.eat();

                // The returned expression is optional
                let value = match self.at().kind {
                    TokenKind::EndLine
                    | TokenKind::EOF
                    | TokenKind::End
                    | TokenKind::Elif
                    | TokenKind::Else => None,
                    _ => self.attempt(|p| p.parse_expr())?,
                };

                Ok(ASTNode::new(
                    NodeKind::Return {
                        value: value.map(Box::new),
                    },
                    self.span_from(&start),
                ))
            }
            TokenKind::Continue => {
                self.eat();
                Ok(ASTNode::new(NodeKind::Continue, self.span_from(&start)))
            }
            TokenKind::Break => {
                self.eat();
                Ok(ASTNode::new(NodeKind::Break, self.span_from(&start)))
            }
            TokenKind::Nonlocal => self.parse_nonlocal(),
            TokenKind::Defer => {
                if self.scopes.is_empty() {
                    return Err(ParserError::OutsideFunction("defer".into()));
                }
                self.eat();

                let expr = self.parse_expr()?;

                Ok(ASTNode::new(
                    NodeKind::Defer {
                        expr: Rc::new(expr),
                    },
                    self.span_from(&start),
                ))
            }
            _ => self.parse_expr(),
        }
    }

    pub(crate) fn parse_expr(&mut self) -> Result<ASTNode, ParserError> {
        if self.at().kind == TokenKind::Var {
            return self.parse_var_declaration();
        }

        self.parse_binary(
            Self::parse_comparison_expr,
            &[BinaryOperator::And, BinaryOperator::Or],
            Self::parse_comparison_expr,
        )
    }

    fn parse_comparison_expr(&mut self) -> Result<ASTNode, ParserError> {
        // 'not' binds looser than the comparison it negates
        if self.at().kind == TokenKind::Not {
            let start = self.at().start().clone();
            self.eat();

            let operand = self.parse_comparison_expr()?;

            return Ok(ASTNode::new(
                NodeKind::UnaryOp {
                    operator: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
                self.span_from(&start),
            ));
        }

        self.parse_binary(
            Self::parse_additive_expr,
            &[
                BinaryOperator::Equal,
                BinaryOperator::NotEqual,
                BinaryOperator::Less,
                BinaryOperator::Greater,
                BinaryOperator::LessEqual,
                BinaryOperator::GreaterEqual,
            ],
            Self::parse_additive_expr,
        )
    }

    fn parse_additive_expr(&mut self) -> Result<ASTNode, ParserError> {
        self.parse_binary(
            Self::parse_multiplicative_expr,
            &[BinaryOperator::Add, BinaryOperator::Sub],
            Self::parse_multiplicative_expr,
        )
    }

    fn parse_multiplicative_expr(&mut self) -> Result<ASTNode, ParserError> {
        self.parse_binary(
            Self::parse_factor,
            &[BinaryOperator::Mul, BinaryOperator::Div],
            Self::parse_factor,
        )
    }

    // Unary sign
    fn parse_factor(&mut self) -> Result<ASTNode, ParserError> {
        let operator = if self.at().is_operator("+") {
            Some(UnaryOperator::Plus)
        } else if self.at().is_operator("-") {
            Some(UnaryOperator::Minus)
        } else {
            None
        };

        match operator {
            Some(operator) => {
                let start = self.at().start().clone();
                self.eat();

                let operand = self.parse_factor()?;

                Ok(ASTNode::new(
                    NodeKind::UnaryOp {
                        operator,
                        operand: Box::new(operand),
                    },
                    self.span_from(&start),
                ))
            }
            None => self.parse_power(),
        }
    }

    // The exponent is a factor so 2 ^ -1 and 2 ^ 3 ^ 2 group to the right
    fn parse_power(&mut self) -> Result<ASTNode, ParserError> {
        self.parse_binary(Self::parse_postfix, &[BinaryOperator::Pow], Self::parse_factor)
    }

    fn parse_binary(
        &mut self,
        left_operand: fn(&mut Self) -> Result<ASTNode, ParserError>,
        operators: &[BinaryOperator],
        right_operand: fn(&mut Self) -> Result<ASTNode, ParserError>,
    ) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        let mut left = left_operand(self)?;

        while let Some(operator) = self.binary_operator_at(operators) {
            // We eat the operator
            self.eat();
            let right = right_operand(self)?;

            left = ASTNode::new(
                NodeKind::BinaryOp {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
                self.span_from(&start),
            );
        }

        Ok(left)
    }

    fn binary_operator_at(&self, operators: &[BinaryOperator]) -> Option<BinaryOperator> {
        let token = self.at();

        match token.kind {
            TokenKind::BinaryOperator | TokenKind::Comparison | TokenKind::And | TokenKind::Or => {
                BinaryOperator::from_symbol(&token.value).filter(|op| operators.contains(op))
            }
            _ => None,
        }
    }

    pub(crate) fn parse_atom(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();

        match self.at().kind {
            TokenKind::Int | TokenKind::Float => self.parse_literal_number_expr(),
            TokenKind::String => {
                let value = self.eat().value;
                Ok(ASTNode::new(NodeKind::String(value), self.span_from(&start)))
            }
            TokenKind::Identifier => {
                let name = self.eat().value;
                Ok(ASTNode::new(NodeKind::VarAccess { name }, self.span_from(&start)))
            }
            // Manages the beginning of paranthesis var a = 5 + (...
            TokenKind::OpenParen => {
                self.eat();
                let mut expr = self.parse_expr()?;
                self.expect_token(TokenKind::CloseParen, "')'")?;

                // The group covers its parenthesis
                expr.span = self.span_from(&start);
                Ok(expr)
            }
            TokenKind::OpenBracket => self.parse_list_expr(),
            TokenKind::OpenBrace => self.parse_dict_expr(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::For => self.parse_for_expr(),
            TokenKind::While => self.parse_while_expr(),
            TokenKind::Function => self.parse_function_def(),
            TokenKind::New => self.parse_new_expr(),
            _ => Err(ParserError::InvalidSyntax(describe(self.at()))),
        }
    }

    fn parse_literal_number_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        let number = self.eat();

        let literal = match number.kind {
            TokenKind::Float => number.value.parse::<f64>().map(NumberLiteral::Float).ok(),
            _ => number.value.parse::<i64>().map(NumberLiteral::Int).ok(),
        }
        .ok_or_else(|| ParserError::InvalidNumber(number.value.clone()))?;

        Ok(ASTNode::new(NodeKind::Number(literal), self.span_from(&start)))
    }

    // Runs a speculative parse. Only a parse that could not even start, without
    // consuming anything, is rewound
    fn attempt<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParserError>,
    ) -> Result<Option<T>, ParserError> {
        let checkpoint = self.cursor;

        match parse(self) {
            Ok(value) => Ok(Some(value)),
            Err(ParserError::InvalidSyntax(_)) if self.cursor == checkpoint => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn at(&self) -> &Token {
        // The stream always ends with EOF, which is never consumed
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    pub(crate) fn eat(&mut self) -> Token {
        let token = self.at().clone();

        if token.kind != TokenKind::EOF {
            self.cursor += 1;
        }

        token
    }

    pub(crate) fn expect_token(
        &mut self,
        token_kind: TokenKind,
        expected: &str,
    ) -> Result<Token, ParserError> {
        if self.at().kind != token_kind {
            return Err(ParserError::expected(expected, self.at()));
        }

        Ok(self.eat())
    }

    // Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: &Position) -> Span {
        let end = match self.cursor {
            0 => start.clone(),
            n => self.tokens[n - 1].span.end.clone(),
        };

        Span::new(start.clone(), end)
    }

    fn is_eof(&self) -> bool {
        self.at().kind == TokenKind::EOF
    }

    pub(crate) fn skip_end_lines(&mut self) -> usize {
        let mut skipped = 0;

        while self.at().kind == TokenKind::EndLine {
            self.eat();
            skipped += 1;
        }

        skipped
    }
}
