use std::rc::Rc;

use tracing::trace;

use super::errors_parser::ParserError;
use super::{FunctionScope, Parser};

use super::TokenKind;
use super::{ASTNode, NodeKind};
use crate::ast::FunctionDefinition;

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

impl Parser {
    // Function definition. The syntaxes are:
    //  function add(x, y) -> x + y
    //
    //  function add(x, y)
    //      var z = x + y
    //      return z * 2
    //  end
    // The name is optional for anonymous functions
    pub(super) fn parse_function_def(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'function' keyword
        self.eat();

        let name = match self.at().kind {
            TokenKind::Identifier => {
                let name = self.eat().value;
                self.expect_token(TokenKind::OpenParen, "'(' after function name")?;
                Some(name)
            }
            _ => {
                self.expect_token(TokenKind::OpenParen, "an identifier or '(' after 'function'")?;
                None
            }
        };

        let params = self.parse_fn_decl_params()?;

        // The body is parsed one function deeper
        self.scopes.push(FunctionScope::default());
        let body = self.parse_fn_body();
        let scope = self.scopes.pop().unwrap_or_default();
        let (body, auto_return) = body?;

        // Names read through 'nonlocal' here must be relayed by the enclosing function
        if let Some(parent) = self.scopes.last_mut() {
            for name in &scope.free_vars {
                push_unique(&mut parent.cell_vars, name);
            }
        }

        trace!(
            name = name.as_deref().unwrap_or("<anonymous>"),
            free = ?scope.free_vars,
            cell = ?scope.cell_vars,
            "function parsed"
        );

        let definition = FunctionDefinition {
            name,
            params,
            body,
            auto_return,
            free_vars: scope.free_vars,
            cell_vars: scope.cell_vars,
        };

        Ok(ASTNode::new(
            NodeKind::FunctionDef(Rc::new(definition)),
            self.span_from(&start),
        ))
    }

    // Parameters after the open paren, up to and including the close paren
    fn parse_fn_decl_params(&mut self) -> Result<Vec<String>, ParserError> {
        let mut params = Vec::new();

        // If we are at a close paren, there is no parameter
        if self.at().kind == TokenKind::Identifier {
            params.push(self.eat().value);

            while self.at().kind == TokenKind::Comma {
                // We eat the comma
                self.eat();
                let param = self
                    .expect_token(TokenKind::Identifier, "an identifier")
                    .map_err(|_| ParserError::ExpectedIdentifier(",".into()))?;
                params.push(param.value);
            }
        }

        self.expect_token(TokenKind::CloseParen, "')' to close the parameter list")?;

        Ok(params)
    }

    fn parse_fn_body(&mut self) -> Result<(ASTNode, bool), ParserError> {
        match self.at().kind {
            // Single expression returned automatically
            TokenKind::SimpleArrow => {
                self.eat();
                Ok((self.parse_expr()?, true))
            }
            TokenKind::EndLine => {
                self.eat();
                let body = self.parse_statements()?;

                if self.at().kind != TokenKind::End {
                    return Err(ParserError::MissingEnd);
                }
                self.eat();

                Ok((body, false))
            }
            _ => Err(ParserError::MissingFunctionBody),
        }
    }

    // Arguments of a call, parenthesis included. New lines are allowed between them
    pub(super) fn parse_call_args(&mut self) -> Result<Vec<ASTNode>, ParserError> {
        // We eat the open paren
        self.expect_token(TokenKind::OpenParen, "'('")?;
        self.skip_end_lines();

        let mut args = Vec::new();

        if self.at().kind != TokenKind::CloseParen {
            args.push(self.parse_expr()?);
            self.skip_end_lines();

            while self.at().kind == TokenKind::Comma {
                // We eat the comma
                self.eat();
                self.skip_end_lines();
                args.push(self.parse_expr()?);
                self.skip_end_lines();
            }
        }

        self.expect_token(TokenKind::CloseParen, "')' to close the call")?;

        Ok(args)
    }

    // nonlocal x
    // Only valid in a function nested in another one
    pub(super) fn parse_nonlocal(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();

        if self.scopes.len() < 2 {
            return Err(ParserError::NonlocalOutsideClosure);
        }
        // We eat the 'nonlocal' keyword
        self.eat();

        let name = self
            .expect_token(TokenKind::Identifier, "an identifier")
            .map_err(|_| ParserError::ExpectedIdentifier("nonlocal".into()))?
            .value;

        if let Some(scope) = self.scopes.last_mut() {
            push_unique(&mut scope.free_vars, &name);
        }

        Ok(ASTNode::new(NodeKind::Nonlocal { name }, self.span_from(&start)))
    }
}
