//! String literal parsing

use crate::syntax::token_type::TokenType;

use super::Lexer;

impl Lexer {
    /// Reads a single- or double-quoted string. Entry: current_char is the
    /// opening quote. Strings may span lines; an EOF before the closing
    /// quote yields `UnterminatedString`.
    pub(super) fn read_string(&mut self, quote: char) -> (TokenType, String) {
        self.read_char(); // skip opening quote
        let mut value = String::new();

        loop {
            match self.current_char {
                None => return (TokenType::UnterminatedString, value),
                Some(ch) if ch == quote => {
                    self.read_char();
                    return (TokenType::String, value);
                }
                Some('\\') => {
                    self.read_char();
                    match self.current_char {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        Some(other) => value.push(other),
                        None => return (TokenType::UnterminatedString, value),
                    }
                    self.read_char();
                }
                Some(ch) => {
                    value.push(ch);
                    self.read_char();
                }
            }
        }
    }
}
