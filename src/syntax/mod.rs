pub mod diagnostic;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod precedence;
pub mod program;
pub mod statement;
pub mod token;
pub mod token_type;

use diagnostic::CompileError;
use lexer::Lexer;
use parser::Parser;
use program::Program;

/// Parses query source, returning the first syntax error if any.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    match parser.errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(program),
    }
}
