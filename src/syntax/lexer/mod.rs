//! The query lexer - tokenizes query source into tokens

mod comments;
mod strings;

use crate::syntax::position::Position;
use crate::syntax::token::Token;
use crate::syntax::token_type::{TokenType, lookup_ident};

/// A `# @msg ...` comment found while lexing.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub text: String,
    pub position: Position,
    /// Char offset of the `#` that opened the comment.
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
    directives: Vec<Directive>,
}

impl Lexer {
    pub fn new(input: impl AsRef<str>) -> Self {
        let mut lexer = Self {
            input: input.as_ref().chars().collect(),
            position: 0,
            read_position: 0,
            current_char: None,
            line: 1,
            column: 0,
            directives: Vec::new(),
        };
        lexer.read_char();
        lexer
    }

    /// Drains the message directives collected so far.
    pub fn take_directives(&mut self) -> Vec<Directive> {
        std::mem::take(&mut self.directives)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_ignorable();

        let start = self.cursor_position();
        let start_offset = self.position;

        let (token_type, literal) = match self.current_char {
            None => (TokenType::Eof, String::new()),
            // Two-character operators
            Some('=') if self.peek_char() == Some('=') => self.take_two(TokenType::Eq, "=="),
            Some('!') if self.peek_char() == Some('=') => self.take_two(TokenType::NotEq, "!="),
            Some('<') if self.peek_char() == Some('=') => self.take_two(TokenType::Lte, "<="),
            Some('>') if self.peek_char() == Some('=') => self.take_two(TokenType::Gte, ">="),
            Some('&') if self.peek_char() == Some('&') => self.take_two(TokenType::And, "&&"),
            Some('|') if self.peek_char() == Some('|') => self.take_two(TokenType::Or, "||"),
            // Single-character operators and delimiters
            Some('=') => self.take_one(TokenType::Assign),
            Some('!') => self.take_one(TokenType::Bang),
            Some('+') => self.take_one(TokenType::Plus),
            Some('-') => self.take_one(TokenType::Minus),
            Some('*') => self.take_one(TokenType::Asterisk),
            Some('/') => self.take_one(TokenType::Slash),
            Some('<') => self.take_one(TokenType::Lt),
            Some('>') => self.take_one(TokenType::Gt),
            Some('.') => self.take_one(TokenType::Dot),
            Some(',') => self.take_one(TokenType::Comma),
            Some(':') => self.take_one(TokenType::Colon),
            Some(';') => self.take_one(TokenType::Semicolon),
            Some('(') => self.take_one(TokenType::LParen),
            Some(')') => self.take_one(TokenType::RParen),
            Some('{') => self.take_one(TokenType::LBrace),
            Some('}') => self.take_one(TokenType::RBrace),
            Some('[') => self.take_one(TokenType::LBracket),
            Some(']') => self.take_one(TokenType::RBracket),
            Some(quote @ ('"' | '\'')) => self.read_string(quote),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) if is_letter(ch) => {
                let ident = self.read_identifier();
                (lookup_ident(&ident), ident)
            }
            Some(ch) => {
                self.read_char();
                (TokenType::Illegal, ch.to_string())
            }
        };

        Token::new(
            token_type,
            literal,
            start,
            self.cursor_position(),
            start_offset,
            self.position,
        )
    }

    pub(super) fn read_char(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        }
        self.current_char = self.input.get(self.read_position).copied();
        self.position = self.read_position.min(self.input.len());
        self.read_position += 1;
        self.column += 1;
    }

    pub(super) fn peek_char(&self) -> Option<char> {
        self.input.get(self.read_position).copied()
    }

    pub(super) fn cursor_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn take_one(&mut self, token_type: TokenType) -> (TokenType, String) {
        let literal = self.current_char.map(String::from).unwrap_or_default();
        self.read_char();
        (token_type, literal)
    }

    fn take_two(&mut self, token_type: TokenType, literal: &str) -> (TokenType, String) {
        self.read_char();
        self.read_char();
        (token_type, literal.to_string())
    }

    fn skip_ignorable(&mut self) {
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() => self.read_char(),
                Some('#') => self.read_comment(),
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.current_char {
            if !is_letter(ch) && !ch.is_ascii_digit() {
                break;
            }
            ident.push(ch);
            self.read_char();
        }
        ident
    }

    fn read_number(&mut self) -> (TokenType, String) {
        let mut literal = String::new();
        let mut token_type = TokenType::Int;
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                literal.push(ch);
                self.read_char();
            } else if ch == '.'
                && token_type == TokenType::Int
                && self.peek_char().is_some_and(|next| next.is_ascii_digit())
            {
                // `1.length` stays a member access, `1.5` is a float.
                token_type = TokenType::Float;
                literal.push(ch);
                self.read_char();
            } else {
                break;
            }
        }
        (token_type, literal)
    }
}

pub(super) fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod lexer_test;
