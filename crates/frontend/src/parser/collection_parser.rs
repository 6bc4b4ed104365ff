use super::errors_parser::ParserError;
use super::Parser;

use super::TokenKind;
use super::{ASTNode, NodeKind};

impl Parser {
    // Parse:
    //  var a = []
    //  var a = [1, 2, 3]
    // New lines are allowed between elements
    pub(super) fn parse_list_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the '['
        self.eat();
        self.skip_end_lines();

        let mut elements = Vec::new();

        if self.at().kind != TokenKind::CloseBracket {
            elements.push(self.parse_expr()?);
            self.skip_end_lines();

            while self.at().kind == TokenKind::Comma {
                // We eat the comma
                self.eat();
                self.skip_end_lines();
                elements.push(self.parse_expr()?);
                self.skip_end_lines();
            }
        }

        self.expect_token(TokenKind::CloseBracket, "']' to close the list")?;

        Ok(ASTNode::new(NodeKind::List { elements }, self.span_from(&start)))
    }

    // Parse:
    //  var d = {}
    //  var d = {'name': 'mars', 1: [2, 3]}
    pub(super) fn parse_dict_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the '{'
        self.eat();
        self.skip_end_lines();

        let mut entries = Vec::new();

        if self.at().kind != TokenKind::CloseBrace {
            entries.push(self.parse_dict_entry()?);

            while self.at().kind == TokenKind::Comma {
                // We eat the comma
                self.eat();
                self.skip_end_lines();
                entries.push(self.parse_dict_entry()?);
            }
        }

        self.expect_token(TokenKind::CloseBrace, "'}' to close the dictionary")?;

        Ok(ASTNode::new(
            NodeKind::Dictionary { entries },
            self.span_from(&start),
        ))
    }

    fn parse_dict_entry(&mut self) -> Result<(ASTNode, ASTNode), ParserError> {
        let key = self.parse_expr()?;
        self.skip_end_lines();
        self.expect_token(TokenKind::Colon, "':' to separate key and value")?;
        self.skip_end_lines();
        let value = self.parse_expr()?;
        self.skip_end_lines();

        Ok((key, value))
    }
}
