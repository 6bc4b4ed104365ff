use super::errors_parser::ParserError;
use super::Parser;

use super::TokenKind;
use super::{ASTNode, NodeKind};
use crate::ast::{ElseCase, ForRange, IfCase};

impl Parser {
    // After 'then' (or 'else'): a new line opens a multi-line block, anything
    // else is a single statement. Returns whether the block discards its value
    fn parse_block_or_statement(&mut self) -> Result<(ASTNode, bool), ParserError> {
        if self.at().kind == TokenKind::EndLine {
            // We eat the new line
            self.eat();
            Ok((self.parse_statements()?, true))
        } else {
            Ok((self.parse_statement()?, false))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParserError> {
        if self.at().kind != TokenKind::End {
            return Err(ParserError::MissingEnd);
        }
        self.eat();

        Ok(())
    }

    // if x then 1 elif y then 2 else 3
    //
    // if x then
    //     ...
    // elif y then
    //     ...
    // else
    //     ...
    // end
    pub(super) fn parse_if_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'if' keyword
        self.eat();

        let mut cases = Vec::new();
        let mut else_case = None;

        loop {
            let condition = self.parse_expr()?;
            self.expect_token(TokenKind::Then, "'then' in if-statement")?;
            let (body, discard) = self.parse_block_or_statement()?;

            cases.push(IfCase {
                condition,
                body,
                discard,
            });

            match self.at().kind {
                TokenKind::Elif => {
                    self.eat();
                }
                TokenKind::Else => {
                    self.eat();
                    let (body, discard) = self.parse_block_or_statement()?;
                    if discard {
                        self.expect_end()?;
                    }

                    else_case = Some(ElseCase {
                        body: Box::new(body),
                        discard,
                    });
                    break;
                }
                // Multi-line cases must be closed
                _ if discard => {
                    self.expect_end()?;
                    break;
                }
                _ => break,
            }
        }

        Ok(ASTNode::new(
            NodeKind::If { cases, else_case },
            self.span_from(&start),
        ))
    }

    // for i = 0 to 10 step 2 then ...
    // for item in values then ...
    pub(super) fn parse_for_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'for' keyword
        self.eat();

        let var = self
            .expect_token(TokenKind::Identifier, "an identifier")
            .map_err(|_| ParserError::ExpectedIdentifier("for".into()))?
            .value;

        let range = match self.at().kind {
            TokenKind::Equals => {
                self.eat();
                let start_value = self.parse_expr()?;
                self.expect_token(TokenKind::To, "'to' after the start value of the for-statement")?;
                let end_value = self.parse_expr()?;

                let step = if self.at().kind == TokenKind::Step {
                    self.eat();
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };

                ForRange::Numeric {
                    start: Box::new(start_value),
                    end: Box::new(end_value),
                    step,
                }
            }
            TokenKind::In => {
                self.eat();
                ForRange::Each {
                    iterable: Box::new(self.parse_expr()?),
                }
            }
            _ => return Err(ParserError::InvalidForHeader),
        };

        self.expect_token(TokenKind::Then, "'then' in for-statement")?;
        let (body, discard) = self.parse_block_or_statement()?;
        if discard {
            self.expect_end()?;
        }

        Ok(ASTNode::new(
            NodeKind::For {
                var,
                range,
                body: Box::new(body),
                discard,
            },
            self.span_from(&start),
        ))
    }

    // while x < 10 then ...
    pub(super) fn parse_while_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'while' keyword
        self.eat();

        let condition = self.parse_expr()?;
        self.expect_token(TokenKind::Then, "'then' after the condition of while-statement")?;

        let (body, discard) = self.parse_block_or_statement()?;
        if discard {
            self.expect_end()?;
        }

        Ok(ASTNode::new(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            self.span_from(&start),
        ))
    }
}
