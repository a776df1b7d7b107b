use crate::syntax::{
    expression::Expression, lexer::Lexer, parser::Parser, program::Program, statement::Statement,
};

fn parse_ok(input: &str) -> Program {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    assert!(
        parser.errors.is_empty(),
        "parser errors: {:?}",
        parser.errors
    );
    program
}

fn parse_err(input: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(input));
    parser.parse_program();
    assert!(!parser.errors.is_empty(), "expected errors for {input:?}");
    parser.errors.iter().map(|e| e.to_string()).collect()
}

#[test]
fn parses_block_projection() {
    let program = parse_ok("mondoo { version }");
    assert_eq!(program.to_string(), "mondoo { version }");
    match &program.statements[0] {
        Statement::Expression {
            expression: Expression::Block { object, body, .. },
            ..
        } => {
            assert!(matches!(**object, Expression::Identifier { .. }));
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected block projection, got {other:?}"),
    }
}

#[test]
fn parses_call_chain_with_block_argument() {
    let program = parse_ok("users.where(name == 'root').list { uid }");
    assert_eq!(
        program.to_string(),
        "users.where((name == \"root\")).list { uid }"
    );
}

#[test]
fn parses_named_arguments() {
    let program = parse_ok("user(name: 'root', uid: 0).home");
    assert_eq!(program.to_string(), "user(name: \"root\", uid: 0).home");
}

#[test]
fn respects_operator_precedence() {
    let program = parse_ok("a + b * c == d && !e || f");
    assert_eq!(
        program.to_string(),
        "((((a + (b * c)) == d) && (!e)) || f)"
    );
}

#[test]
fn parses_assignments_and_newline_separated_statements() {
    let program = parse_ok("a = 3\nif(true) {\n a == 3\n}");
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(program.statements[0], Statement::Assign { .. }));
    assert_eq!(program.to_string(), "a = 3; if (true) { (a == 3) }");
}

#[test]
fn parses_if_else() {
    let program = parse_ok("if (x > 1) { 'a' } else { 'b' }");
    assert_eq!(program.to_string(), "if ((x > 1)) { \"a\" } else { \"b\" }");
}

#[test]
fn parses_array_and_map_literals() {
    let program = parse_ok("[1, 2, 3,].where(_ > 1); {a: 1, 'b c': [true]}");
    assert_eq!(
        program.to_string(),
        "[1, 2, 3].where((_ > 1)); {a: 1, b c: [true]}"
    );
}

#[test]
fn parses_index_expressions() {
    let program = parse_ok("sshd.config.params['Port'] == 22; users.list[0]");
    assert_eq!(
        program.to_string(),
        "(sshd.config.params[\"Port\"] == 22); users.list[0]"
    );
}

#[test]
fn attaches_message_directive_to_following_query() {
    let program = parse_ok("# @msg Found ${length} users\nusers.none(uid == 0)\nmondoo.version");
    match &program.statements[0] {
        Statement::Expression { message, .. } => {
            let message = message.as_ref().expect("message attached");
            assert_eq!(message.template, "Found ${length} users");
        }
        other => panic!("expected expression statement, got {other:?}"),
    }
    match &program.statements[1] {
        Statement::Expression { message, .. } => assert!(message.is_none()),
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn dangling_message_directive_is_an_error() {
    let errors = parse_err("mondoo.version\n# @msg nothing follows");
    assert_eq!(errors, vec!["2:1: @msg directive is not followed by a query"]);
}

#[test]
fn reports_missing_closing_paren() {
    let errors = parse_err("users.where(uid == 0");
    assert_eq!(errors, vec!["1:21: expected `)`, found end of query"]);
}

#[test]
fn reports_unterminated_block() {
    let errors = parse_err("mondoo { version");
    assert!(errors[0].contains("unterminated block"), "{errors:?}");
}

#[test]
fn reports_unterminated_string() {
    let errors = parse_err("mondoo.version == 'abc");
    assert!(errors[0].contains("unterminated string"), "{errors:?}");
}

#[test]
fn reports_stray_closing_brace() {
    let errors = parse_err("mondoo }");
    assert!(errors[0].contains("unexpected `}`"), "{errors:?}");
}
