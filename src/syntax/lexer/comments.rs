//! Comment handling and `@msg` directives

use super::{Directive, Lexer};

const MSG_DIRECTIVE: &str = "@msg";

impl Lexer {
    /// Skips a `#` comment up to (not including) the newline. A comment whose
    /// body starts with `@msg` is kept as a directive.
    pub(super) fn read_comment(&mut self) {
        let position = self.cursor_position();
        let offset = self.position;
        self.read_char(); // consume '#'

        let mut body = String::new();
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            body.push(ch);
            self.read_char();
        }

        let body = body.trim();
        if let Some(rest) = body.strip_prefix(MSG_DIRECTIVE)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            self.directives.push(Directive {
                text: rest.trim().to_string(),
                position,
                offset,
            });
        }
    }
}
