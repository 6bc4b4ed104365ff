use super::errors_parser::ParserError;
use super::Parser;

use super::TokenKind;
use super::{ASTNode, NodeKind};

impl Parser {
    // Variable declaration, always with a value:
    //  var x = 5
    //  var x = var y = 5
    pub(super) fn parse_var_declaration(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'var' keyword
        self.eat();

        let name = self
            .expect_token(TokenKind::Identifier, "an identifier")
            .map_err(|_| ParserError::ExpectedIdentifier("var".into()))?
            .value;

        self.expect_token(TokenKind::Equals, "'='")?;
        let value = self.parse_expr()?;

        Ok(ASTNode::new(
            NodeKind::VarAssign {
                name,
                value: Box::new(value),
            },
            self.span_from(&start),
        ))
    }

    // An atom followed by any sequence of:
    //  values[i]
    //  planet.radius
    //  planet.get_radius(...)
    //  callback(...)
    // optionally closed by '= expr' when the last step is an accessor
    pub(super) fn parse_postfix(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        let mut node = self.parse_atom()?;
        let mut steps = 0;

        loop {
            let kind = match self.at().kind {
                TokenKind::OpenBracket => {
                    // We eat the bracket
                    self.eat();
                    self.skip_end_lines();
                    let index = self.parse_expr()?;
                    self.skip_end_lines();
                    self.expect_token(TokenKind::CloseBracket, "']' to close the subscription")?;

                    NodeKind::Subscription {
                        target: Box::new(node),
                        index: Box::new(index),
                        value: None,
                    }
                }
                TokenKind::Dot => {
                    // We eat the dot
                    self.eat();
                    let attr = self
                        .expect_token(TokenKind::Identifier, "an identifier")
                        .map_err(|_| ParserError::ExpectedIdentifier(".".into()))?
                        .value;

                    // Method call like planet.get_radius()
                    if self.at().kind == TokenKind::OpenParen {
                        NodeKind::AttributionCall {
                            target: Box::new(node),
                            attr,
                            args: self.parse_call_args()?,
                        }
                    } else {
                        NodeKind::Attribution {
                            target: Box::new(node),
                            attr,
                            value: None,
                        }
                    }
                }
                TokenKind::OpenParen => NodeKind::FunctionCall {
                    target: Box::new(node),
                    args: self.parse_call_args()?,
                },
                _ => break,
            };

            node = ASTNode::new(kind, self.span_from(&start));
            steps += 1;
        }

        if self.at().kind == TokenKind::Equals {
            node = self.parse_accessor_assignment(node)?;
            node.span = self.span_from(&start);
        }

        if steps >= 2 {
            let span = node.span.clone();
            node = ASTNode::new(
                NodeKind::AdvancedAccess {
                    chain: Box::new(node),
                },
                span,
            );
        }

        Ok(node)
    }

    // Stores the assigned value on the last accessor of the chain
    fn parse_accessor_assignment(&mut self, mut node: ASTNode) -> Result<ASTNode, ParserError> {
        match &node.kind {
            NodeKind::FunctionCall { .. } | NodeKind::AttributionCall { .. } => {
                return Err(ParserError::AssignToCall)
            }
            NodeKind::VarAccess { name } => {
                return Err(ParserError::AssignWithoutVar(name.clone()))
            }
            NodeKind::Subscription { .. } | NodeKind::Attribution { .. } => {}
            _ => return Err(ParserError::InvalidAssignTarget),
        }

        // We eat the '='
        self.eat();
        let assigned = self.parse_expr()?;

        match &mut node.kind {
            NodeKind::Subscription { value, .. } | NodeKind::Attribution { value, .. } => {
                *value = Some(Box::new(assigned));
            }
            _ => return Err(ParserError::InvalidAssignTarget),
        }

        Ok(node)
    }

    // The constructor call is split from the prototype it is called on:
    //  new Planet(1, 2)      -> prototype Planet, args (1, 2)
    //  new space.Planet(1)   -> prototype space.Planet, args (1)
    //  new Planet            -> prototype Planet, no args
    pub(super) fn parse_new_expr(&mut self) -> Result<ASTNode, ParserError> {
        let start = self.at().start().clone();
        // We eat the 'new' keyword
        self.eat();

        let ASTNode { kind, span } = self.parse_postfix()?;
        let (chain, chain_span) = match kind {
            NodeKind::AdvancedAccess { chain } => (chain.kind, chain.span),
            other => (other, span),
        };

        let (prototype, args) = match chain {
            NodeKind::FunctionCall { target, args } => (*target, args),
            NodeKind::AttributionCall { target, attr, args } => {
                let span = target.span.to(&chain_span);
                let prototype = ASTNode::new(
                    NodeKind::Attribution {
                        target,
                        attr,
                        value: None,
                    },
                    span,
                );
                (prototype, args)
            }
            other => (ASTNode::new(other, chain_span), vec![]),
        };

        Ok(ASTNode::new(
            NodeKind::NewExpression {
                prototype: Box::new(prototype),
                args,
            },
            self.span_from(&start),
        ))
    }
}
