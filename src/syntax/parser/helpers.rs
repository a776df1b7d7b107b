use crate::syntax::{
    diagnostic::CompileError,
    position::Span,
    precedence::{Precedence, token_precedence},
    token_type::TokenType,
};

use super::Parser;

impl Parser {
    // Token navigation
    pub(super) fn next_token(&mut self) {
        self.current_token = self.peek_token.clone();
        self.peek_token = self.lexer.next_token();
    }

    pub(super) fn is_current_token(&self, token_type: TokenType) -> bool {
        self.current_token.token_type == token_type
    }

    pub(super) fn is_peek_token(&self, token_type: TokenType) -> bool {
        self.peek_token.token_type == token_type
    }

    pub(super) fn expect_peek(&mut self, token_type: TokenType) -> bool {
        if self.is_peek_token(token_type) {
            self.next_token();
            true
        } else {
            self.peek_error(token_type);
            false
        }
    }

    // Span utilities
    pub(super) fn span_from(&self, start: Span) -> Span {
        start.merge(self.current_token.span())
    }

    // Precedence helpers
    pub(super) fn current_precedence(&self) -> Precedence {
        token_precedence(&self.current_token.token_type)
    }

    pub(super) fn peek_precedence(&self) -> Precedence {
        token_precedence(&self.peek_token.token_type)
    }

    // Errors
    pub(super) fn peek_error(&mut self, expected: TokenType) {
        let message = if self.peek_token.token_type == TokenType::Eof {
            format!("expected `{}`, found end of query", expected)
        } else {
            format!(
                "expected `{}`, found `{}`",
                expected, self.peek_token.literal
            )
        };
        self.errors
            .push(CompileError::new(self.peek_token.position, message));
    }

    pub(super) fn error_at_current(&mut self, message: impl Into<String>) {
        self.errors
            .push(CompileError::new(self.current_token.position, message));
    }
}
