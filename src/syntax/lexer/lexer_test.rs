use crate::syntax::{lexer::Lexer, token_type::TokenType};

fn token_types(input: &str) -> Vec<TokenType> {
    let mut lexer = Lexer::new(input);
    let mut types = Vec::new();
    loop {
        let tok = lexer.next_token();
        if tok.token_type == TokenType::Eof {
            break;
        }
        types.push(tok.token_type);
    }
    types
}

#[test]
fn lexes_operators_and_delimiters() {
    assert_eq!(
        token_types("a == 1 && b != 'x' || c <= 2.5"),
        vec![
            TokenType::Ident,
            TokenType::Eq,
            TokenType::Int,
            TokenType::And,
            TokenType::Ident,
            TokenType::NotEq,
            TokenType::String,
            TokenType::Or,
            TokenType::Ident,
            TokenType::Lte,
            TokenType::Float,
        ]
    );
}

#[test]
fn lexes_keywords_and_underscore() {
    assert_eq!(
        token_types("if (true) { _ } else { null }"),
        vec![
            TokenType::If,
            TokenType::LParen,
            TokenType::True,
            TokenType::RParen,
            TokenType::LBrace,
            TokenType::Underscore,
            TokenType::RBrace,
            TokenType::Else,
            TokenType::LBrace,
            TokenType::Null,
            TokenType::RBrace,
        ]
    );
}

#[test]
fn integer_followed_by_member_access_is_not_a_float() {
    assert_eq!(
        token_types("1.length"),
        vec![TokenType::Int, TokenType::Dot, TokenType::Ident]
    );
}

#[test]
fn string_literals_unescape() {
    let mut lexer = Lexer::new(r#"'it\'s' "a\tb""#);
    let first = lexer.next_token();
    assert_eq!(first.token_type, TokenType::String);
    assert_eq!(first.literal, "it's");
    let second = lexer.next_token();
    assert_eq!(second.literal, "a\tb");
}

#[test]
fn unterminated_string_is_reported() {
    let mut lexer = Lexer::new("'abc");
    assert_eq!(lexer.next_token().token_type, TokenType::UnterminatedString);
}

#[test]
fn comments_are_skipped_and_msg_directives_collected() {
    let source = "[1,2,3].\n# @msg Found ${length} numbers\nnone( _ > 1 )\n# plain comment";
    let mut lexer = Lexer::new(source);
    while lexer.next_token().token_type != TokenType::Eof {}

    let directives = lexer.take_directives();
    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].text, "Found ${length} numbers");
    assert_eq!(directives[0].position.line, 2);
    assert_eq!(directives[0].position.column, 1);
}

#[test]
fn tracks_lines_and_columns() {
    let mut lexer = Lexer::new("a\n  bc");
    let a = lexer.next_token();
    assert_eq!((a.position.line, a.position.column), (1, 1));
    let bc = lexer.next_token();
    assert_eq!((bc.position.line, bc.position.column), (2, 3));
    assert_eq!((bc.offset, bc.end_offset), (4, 6));
}
