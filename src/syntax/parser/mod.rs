use crate::syntax::{
    diagnostic::CompileError,
    lexer::{Directive, Lexer},
    position::Position,
    program::Program,
    statement::{Message, Statement},
    token::Token,
    token_type::TokenType,
};

mod expression;
mod helpers;
mod statement;

pub struct Parser {
    pub(super) lexer: Lexer,
    pub(super) current_token: Token,
    pub(super) peek_token: Token,
    pub errors: Vec<CompileError>,
    directives: Vec<Directive>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let eof = Token::new(
            TokenType::Eof,
            "",
            Position::default(),
            Position::default(),
            0,
            0,
        );
        let mut parser = Parser {
            lexer,
            current_token: eof.clone(),
            peek_token: eof,
            errors: Vec::new(),
            directives: Vec::new(),
        };
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let start = self.current_token.span();
        let mut program = Program::new();

        while self.current_token.token_type != TokenType::Eof {
            if self.current_token.token_type == TokenType::RBrace {
                self.error_at_current("unexpected `}` outside of a block");
                self.next_token();
                continue;
            }
            if let Some(statement) = self.parse_statement() {
                program.statements.push(statement);
            }
            self.next_token();
        }

        self.directives.extend(self.lexer.take_directives());
        if let Some(directive) = self.directives.first() {
            self.errors.push(CompileError::new(
                directive.position,
                "@msg directive is not followed by a query",
            ));
        }

        program.span = start.merge(self.current_token.span());
        program
    }

    /// Hands every pending directive that starts before `end_offset` to the
    /// statement that just finished parsing. The last one wins.
    pub(super) fn claim_directives(&mut self, statement: &mut Statement, end_offset: usize) {
        self.directives.extend(self.lexer.take_directives());
        let (claimed, rest): (Vec<_>, Vec<_>) = self
            .directives
            .drain(..)
            .partition(|d| d.offset < end_offset);
        self.directives = rest;

        if let Some(directive) = claimed.into_iter().last()
            && matches!(statement, Statement::Expression { .. })
        {
            let span = statement.span();
            statement.attach_message(Message {
                template: directive.text,
                span,
            });
        }
    }
}

#[cfg(test)]
mod parser_test;
