use crate::syntax::{
    expression::{Argument, Expression},
    precedence::Precedence,
    token_type::TokenType,
};

use super::Parser;

impl Parser {
    // Core expression parsing
    pub(super) fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.is_peek_token(TokenType::Semicolon)
            && !self.is_peek_token(TokenType::Eof)
            && precedence < self.peek_precedence()
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    pub(super) fn parse_prefix(&mut self) -> Option<Expression> {
        let span = self.current_token.span();
        match self.current_token.token_type {
            TokenType::Ident => Some(Expression::Identifier {
                name: self.current_token.literal.clone(),
                span,
            }),
            TokenType::Underscore => Some(Expression::SelfRef { span }),
            TokenType::Int => self.parse_integer(),
            TokenType::Float => self.parse_float(),
            TokenType::String => Some(Expression::String {
                value: self.current_token.literal.clone(),
                span,
            }),
            TokenType::True | TokenType::False => Some(Expression::Boolean {
                value: self.is_current_token(TokenType::True),
                span,
            }),
            TokenType::Null => Some(Expression::Null { span }),
            TokenType::Bang | TokenType::Minus => self.parse_prefix_expression(),
            TokenType::LParen => self.parse_grouped_expression(),
            TokenType::LBracket => self.parse_array(),
            TokenType::LBrace => self.parse_map(),
            TokenType::If => self.parse_if_expression(),
            TokenType::UnterminatedString => {
                self.error_at_current("unterminated string literal");
                None
            }
            _ => {
                let message = if self.is_current_token(TokenType::Eof) {
                    "expected an expression, found end of query".to_string()
                } else {
                    format!(
                        "expected an expression, found `{}`",
                        self.current_token.literal
                    )
                };
                self.error_at_current(message);
                None
            }
        }
    }

    pub(super) fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        match self.current_token.token_type {
            TokenType::Plus
            | TokenType::Minus
            | TokenType::Asterisk
            | TokenType::Slash
            | TokenType::Lt
            | TokenType::Gt
            | TokenType::Lte
            | TokenType::Gte
            | TokenType::Eq
            | TokenType::NotEq
            | TokenType::And
            | TokenType::Or => self.parse_infix_expression(left),
            TokenType::LParen => self.parse_call_expression(left),
            TokenType::LBracket => self.parse_index_expression(left),
            TokenType::Dot => self.parse_member_access(left),
            TokenType::LBrace => self.parse_block_expression(left),
            _ => Some(left),
        }
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        let span = self.current_token.span();
        match self.current_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer { value, span }),
            Err(_) => {
                let message = format!(
                    "could not parse `{}` as an integer",
                    self.current_token.literal
                );
                self.error_at_current(message);
                None
            }
        }
    }

    fn parse_float(&mut self) -> Option<Expression> {
        let span = self.current_token.span();
        match self.current_token.literal.parse::<f64>() {
            Ok(value) => Some(Expression::Float { value, span }),
            Err(_) => {
                let message = format!(
                    "could not parse `{}` as a float",
                    self.current_token.literal
                );
                self.error_at_current(message);
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let start = self.current_token.span();
        let operator = self.current_token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
            span: self.span_from(start),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RParen) {
            return None;
        }
        Some(expression)
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let start = self.current_token.span();
        let mut elements = Vec::new();

        if self.is_peek_token(TokenType::RBracket) {
            self.next_token();
            return Some(Expression::Array {
                elements,
                span: self.span_from(start),
            });
        }

        self.next_token();
        elements.push(self.parse_expression(Precedence::Lowest)?);
        while self.is_peek_token(TokenType::Comma) {
            self.next_token();
            if self.is_peek_token(TokenType::RBracket) {
                break;
            }
            self.next_token();
            elements.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(TokenType::RBracket) {
            return None;
        }
        Some(Expression::Array {
            elements,
            span: self.span_from(start),
        })
    }

    fn parse_map(&mut self) -> Option<Expression> {
        let start = self.current_token.span();
        let mut entries = Vec::new();

        while !self.is_peek_token(TokenType::RBrace) {
            self.next_token();
            let key = match self.current_token.token_type {
                TokenType::Ident | TokenType::String => self.current_token.literal.clone(),
                _ => {
                    let message = format!(
                        "expected a map key, found `{}`",
                        self.current_token.literal
                    );
                    self.error_at_current(message);
                    return None;
                }
            };
            if !self.expect_peek(TokenType::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            entries.push((key, value));

            if self.is_peek_token(TokenType::Comma) {
                self.next_token();
            } else if !self.is_peek_token(TokenType::RBrace) {
                self.peek_error(TokenType::RBrace);
                return None;
            }
        }
        self.next_token();

        Some(Expression::Map {
            entries,
            span: self.span_from(start),
        })
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let start = self.current_token.span();
        if !self.expect_peek(TokenType::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RParen) {
            return None;
        }
        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statements()?;

        let alternative = if self.is_peek_token(TokenType::Else) {
            self.next_token();
            if !self.expect_peek(TokenType::LBrace) {
                return None;
            }
            Some(self.parse_block_statements()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
            span: self.span_from(start),
        })
    }

    // Infix expressions
    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.current_token.literal.clone();
        let precedence = self.current_precedence();
        let start = left.span();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        let span = start.merge(right.span());
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let start = function.span();
        let mut arguments = Vec::new();

        if self.is_peek_token(TokenType::RParen) {
            self.next_token();
        } else {
            loop {
                self.next_token();
                arguments.push(self.parse_argument()?);
                if self.is_peek_token(TokenType::Comma) {
                    self.next_token();
                    continue;
                }
                if !self.expect_peek(TokenType::RParen) {
                    return None;
                }
                break;
            }
        }

        Some(Expression::Call {
            function: Box::new(function),
            arguments,
            span: self.span_from(start),
        })
    }

    fn parse_argument(&mut self) -> Option<Argument> {
        let name = if self.is_current_token(TokenType::Ident) && self.is_peek_token(TokenType::Colon)
        {
            let name = self.current_token.literal.clone();
            self.next_token(); // ':'
            self.next_token();
            Some(name)
        } else {
            None
        };
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Argument { name, value })
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        let start = left.span();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RBracket) {
            return None;
        }
        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
            span: self.span_from(start),
        })
    }

    fn parse_member_access(&mut self, object: Expression) -> Option<Expression> {
        let start = object.span();
        if !self.expect_peek(TokenType::Ident) {
            return None;
        }
        let member = self.current_token.literal.clone();
        Some(Expression::MemberAccess {
            object: Box::new(object),
            member,
            span: self.span_from(start),
        })
    }

    fn parse_block_expression(&mut self, object: Expression) -> Option<Expression> {
        let start = object.span();
        let body = self.parse_block_statements()?;
        Some(Expression::Block {
            object: Box::new(object),
            body,
            span: self.span_from(start),
        })
    }
}
