use crate::syntax::{precedence::Precedence, statement::Statement, token_type::TokenType};

use super::Parser;

impl Parser {
    /// Parses one statement. On return `current_token` is the last token of
    /// the statement (or its trailing `;`).
    pub(super) fn parse_statement(&mut self) -> Option<Statement> {
        if self.is_current_token(TokenType::Semicolon) {
            return None;
        }

        let mut statement =
            if self.is_current_token(TokenType::Ident) && self.is_peek_token(TokenType::Assign) {
                self.parse_assign_statement()?
            } else {
                self.parse_expression_statement()?
            };

        let end_offset = self.current_token.end_offset;
        self.claim_directives(&mut statement, end_offset);

        if self.is_peek_token(TokenType::Semicolon) {
            self.next_token();
        }
        Some(statement)
    }

    fn parse_assign_statement(&mut self) -> Option<Statement> {
        let start = self.current_token.span();
        let name = self.current_token.literal.clone();
        self.next_token(); // '='
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Statement::Assign {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let start = self.current_token.span();
        let expression = self.parse_expression(Precedence::Lowest)?;
        Some(Statement::Expression {
            expression,
            message: None,
            span: self.span_from(start),
        })
    }

    /// Parses `{ statements }`. Entry: current_token is `{`; exit: `}`.
    pub(super) fn parse_block_statements(&mut self) -> Option<Vec<Statement>> {
        let mut statements = Vec::new();
        self.next_token();

        while !self.is_current_token(TokenType::RBrace) {
            if self.is_current_token(TokenType::Eof) {
                self.error_at_current("unterminated block, expected `}`");
                return None;
            }
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        Some(statements)
    }
}
