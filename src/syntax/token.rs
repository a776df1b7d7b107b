use std::fmt;

use super::position::{Position, Span};
use super::token_type::TokenType;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub position: Position,
    pub end_position: Position,
    /// Char offsets of the token in the source.
    pub offset: usize,
    pub end_offset: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        literal: impl Into<String>,
        position: Position,
        end_position: Position,
        offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            position,
            end_position,
            offset,
            end_offset,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(
            self.position,
            self.end_position,
            self.offset,
            self.end_offset,
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({}, {:?}, {})",
            self.token_type, self.literal, self.position
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_span_covers_offsets() {
        let tok = Token::new(
            TokenType::Ident,
            "mondoo",
            Position::new(1, 1),
            Position::new(1, 7),
            0,
            6,
        );
        let span = tok.span();
        assert_eq!(span.start_offset, 0);
        assert_eq!(span.end_offset, 6);
        assert_eq!(span.start.column, 1);
    }

    #[test]
    fn test_token_display() {
        let tok = Token::new(
            TokenType::If,
            "if",
            Position::new(2, 5),
            Position::new(2, 7),
            10,
            12,
        );
        let s = format!("{}", tok);
        assert!(s.contains("if"));
        assert!(s.contains("2:5"));
    }
}
