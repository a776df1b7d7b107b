use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Special
    Illegal,
    UnterminatedString,
    Eof,

    // Identifiers and literals
    Ident,
    Underscore,
    Int,
    Float,
    String,

    // Arithmetic Operators
    Plus,
    Minus,
    Asterisk,
    Slash,

    // Comparison Operators
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    NotEq,

    // Logical operators
    Bang,
    And,
    Or,

    // Assignment
    Assign,

    // Delimiters
    Dot,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    If,
    Else,
    True,
    False,
    Null,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            // Special
            TokenType::Illegal => "ILLEGAL",
            TokenType::UnterminatedString => "UNTERMINATED_STRING",
            TokenType::Eof => "EOF",

            // Identifiers and literals
            TokenType::Ident => "IDENT",
            TokenType::Underscore => "_",
            TokenType::Int => "INT",
            TokenType::Float => "FLOAT",
            TokenType::String => "STRING",

            // Arithmetic Operators
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Asterisk => "*",
            TokenType::Slash => "/",

            // Comparison Operators
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::Lte => "<=",
            TokenType::Gte => ">=",
            TokenType::Eq => "==",
            TokenType::NotEq => "!=",

            // Logical operators
            TokenType::Bang => "!",
            TokenType::And => "&&",
            TokenType::Or => "||",

            // Assignment
            TokenType::Assign => "=",

            // Delimiters
            TokenType::Dot => ".",
            TokenType::Comma => ",",
            TokenType::Colon => ":",
            TokenType::Semicolon => ";",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::LBrace => "{",
            TokenType::RBrace => "}",
            TokenType::LBracket => "[",
            TokenType::RBracket => "]",

            // Keywords
            TokenType::If => "if",
            TokenType::Else => "else",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Null => "null",
        };
        write!(f, "{}", s)
    }
}

pub fn lookup_ident(ident: &str) -> TokenType {
    match ident {
        "_" => TokenType::Underscore,
        "if" => TokenType::If,
        "else" => TokenType::Else,
        "true" => TokenType::True,
        "false" => TokenType::False,
        "null" => TokenType::Null,
        _ => TokenType::Ident,
    }
}
