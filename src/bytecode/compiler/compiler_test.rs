use crate::{
    bytecode::{
        chunk::{ChunkRef, Primitive},
        code_bundle::{AssertionKind, CodeBundle},
        compiler::compile,
        types::Type,
    },
    config::CompilerConfig,
    schema::{ResourceInfo, Schema},
};

fn schema() -> Schema {
    Schema::new()
        .with(
            ResourceInfo::new("mondoo")
                .field("version", Type::String)
                .field("build", Type::String),
        )
        .with(
            ResourceInfo::new("user")
                .init_arg("name", Type::String)
                .field("name", Type::String)
                .field("uid", Type::Int)
                .field("home", Type::String),
        )
        .with(ResourceInfo::new("users").list_of(Type::resource("user")))
        .with(
            ResourceInfo::new("sshd.config")
                .field("params", Type::map(Type::String, Type::String)),
        )
}

fn compile_ok(source: &str) -> CodeBundle {
    compile(source, &schema(), &CompilerConfig::default())
        .unwrap_or_else(|err| panic!("failed to compile {source:?}: {err}"))
}

fn compile_err(source: &str) -> String {
    match compile(source, &schema(), &CompilerConfig::default()) {
        Ok(bundle) => panic!("expected {source:?} to fail, got:\n{}", bundle.dump()),
        Err(err) => err.message,
    }
}

const MONDOO_VERSION: &str = "-> block 1\n   entrypoints: [<1,2>]\n   1: mondoo \n   2: {} bind: <1,1> type:block (=> <2,0>)\n-> block 2\n   entrypoints: [<2,2>]\n   1: mondoo id = context\n   2: version bind: <2,1> type:string\n";

#[test]
fn projection_binds_resource_as_self() {
    assert_eq!(compile_ok("mondoo { version }").dump(), MONDOO_VERSION);
    assert_eq!(compile_ok("mondoo { _.version }").dump(), MONDOO_VERSION);
}

#[test]
fn where_filter_opens_item_block() {
    assert_eq!(
        compile_ok("[1].where( _ > 0 )").dump(),
        "-> block 1\n   entrypoints: [<1,2>]\n   1: [\n     0: 1\n   ]\n   2: where bind: <1,1> type:[]int (ref<1,1>, => <2,0>)\n-> block 2\n   entrypoints: [<2,2>]\n   1: _\n   2: >\u{5} bind: <2,1> type:bool (0)\n"
    );
}

#[test]
fn if_block_captures_outer_variables() {
    assert_eq!(
        compile_ok("a = 3\n if(true) {\n a == 3 \n}").dump(),
        "-> block 1\n   entrypoints: [<1,2>]\n   1: 3\n   2: if bind: <0,0> type:block (true, => <2,0>, [\n     0: ref<1,1>\n   ])\n-> block 2\n   entrypoints: [<2,2>]\n   1: ref<1,1>\n   2: ==\u{5} bind: <2,1> type:bool (3)\n"
    );
}

#[test]
fn comparison_becomes_assertion_with_datapoint() {
    let bundle = compile_ok("mondoo.build == 1");
    let assertion_ref = ChunkRef::new(1, 3);
    let assertion = &bundle.assertions[&assertion_ref];
    assert_eq!(
        assertion.kind,
        AssertionKind::Comparison {
            operator: "==".into(),
            actual: ChunkRef::new(1, 2),
            expected: Primitive::Int(1),
        }
    );
    assert_eq!(bundle.blocks[0].datapoints, vec![ChunkRef::new(1, 2)]);
    assert_eq!(bundle.label(assertion_ref), "mondoo.build == 1");
    assert_eq!(bundle.label(ChunkRef::new(1, 2)), "mondoo.build");
}

#[test]
fn all_quantifier_filters_failing_items() {
    let bundle = compile_ok("users.all(uid < 1000)");
    assert_eq!(
        bundle.dump(),
        "-> block 1\n   entrypoints: [<1,4>]\n   datapoints: [<1,3>, <1,2>]\n   1: users \n   2: list bind: <1,1> type:[]user\n   3: $whereNot bind: <1,2> type:[]user (ref<1,2>, => <2,0>)\n   4: $all bind: <1,3> type:bool\n-> block 2\n   entrypoints: [<2,3>]\n   1: user id = context\n   2: uid bind: <2,1> type:int\n   3: <\u{5} bind: <2,2> type:bool (1000)\n"
    );
    assert_eq!(
        bundle.assertions[&ChunkRef::new(1, 4)].kind,
        AssertionKind::Quantifier {
            quantifier: "all".into(),
            offending: ChunkRef::new(1, 3),
            source: ChunkRef::new(1, 2),
        }
    );
    assert_eq!(bundle.label(ChunkRef::new(1, 4)), "users.all()");
    assert_eq!(bundle.label(ChunkRef::new(1, 3)), "users.where");
    assert_eq!(bundle.label(ChunkRef::new(1, 2)), "users");
}

#[test]
fn any_quantifier_reports_the_whole_list() {
    let bundle = compile_ok("users.any(name == 'root')");
    let (_, assertion) = bundle.assertions.iter().next().unwrap();
    assert_eq!(
        assertion.kind,
        AssertionKind::Quantifier {
            quantifier: "any".into(),
            offending: ChunkRef::new(1, 2),
            source: ChunkRef::new(1, 2),
        }
    );
}

#[test]
fn list_resource_statement_reads_its_list() {
    let bundle = compile_ok("users");
    assert_eq!(bundle.blocks[0].entrypoints, vec![ChunkRef::new(1, 2)]);
    assert_eq!(bundle.label(ChunkRef::new(1, 2)), "users.list");
}

#[test]
fn dotted_resource_names_resolve() {
    let bundle = compile_ok("sshd.config.params['Port']");
    let dump = bundle.dump();
    assert!(dump.contains("1: sshd.config \n"), "{dump}");
    assert!(dump.contains("3: [] bind: <1,2> type:string (\"Port\")"), "{dump}");
    assert_eq!(bundle.label(ChunkRef::new(1, 3)), "sshd.config.params[Port]");
}

#[test]
fn resource_arguments_are_name_value_pairs() {
    let dump = compile_ok("user(name: 'root').uid").dump();
    assert!(dump.contains("1: user bind: <0,0> type:user (\"name\", \"root\")"), "{dump}");
}

#[test]
fn literal_statements_have_no_label() {
    let bundle = compile_ok("[]; {}");
    assert_eq!(bundle.label(ChunkRef::new(1, 1)), "");
    assert_eq!(bundle.label(ChunkRef::new(1, 2)), "");
}

#[test]
fn bundle_ids_are_deterministic() {
    let a = compile_ok("mondoo.version");
    let b = compile_ok("mondoo.version");
    let c = compile_ok("mondoo.build");
    assert_eq!(a.id, b.id);
    assert_ne!(a.id, c.id);
    assert_eq!(a.id.len(), 64);
}

#[test]
fn message_attaches_to_assertion() {
    let bundle = compile_ok(
        "# @msg Expected ${$expected.length} users but got ${length}\nusers.none(uid == 0)",
    );
    let (_, assertion) = bundle.assertions.iter().next().unwrap();
    let message = assertion.message.as_ref().expect("message");
    assert_eq!(
        message.source,
        "Expected ${$expected.length} users but got ${length}"
    );
}

#[test]
fn messages_inside_if_bodies_are_assertions() {
    let bundle = compile_ok(
        "if(true) {\n  # @msg Expected ${$expected.length} users but got ${length}\n  users.none( uid == 0 )\n}",
    );
    let assertion = &bundle.assertions[&ChunkRef::new(2, 4)];
    assert!(assertion.message.is_some());
    assert_eq!(
        bundle.blocks[1].datapoints,
        vec![ChunkRef::new(2, 3), ChunkRef::new(2, 2)]
    );

    // Without a message, nested comparisons stay plain values.
    let plain = compile_ok("if(true) { mondoo.version == 'x' }");
    assert!(plain.assertions.is_empty());
    assert!(plain.blocks[1].datapoints.is_empty());
}

#[test]
fn reports_unknown_names_with_suggestions() {
    assert_eq!(
        compile_err("mondoo.verison"),
        "unknown field 'verison' on resource 'mondoo', did you mean 'version'?"
    );
    assert_eq!(
        compile_err("mondo.version"),
        "unknown identifier 'mondo', did you mean 'mondoo'?"
    );
}

#[test]
fn rejects_invalid_operations() {
    assert_eq!(
        compile_err("mondoo.version < 3"),
        "type mismatch: cannot apply '<' to string and int"
    );
    assert_eq!(compile_err("users.all()"), "all() requires a condition");
    assert_eq!(
        compile_err("_.version"),
        "`_` can only be used inside a block"
    );
}

#[test]
fn rejects_misplaced_messages() {
    assert_eq!(
        compile_err("# @msg hello\nmondoo.version"),
        "@msg must be followed by an assertion"
    );
    assert_eq!(
        compile_err("mondoo {\n  # @msg hello\n  version\n}"),
        "@msg must be followed by an assertion"
    );
    assert_eq!(
        compile_err("# @msg nope ${size}\nmondoo.version == 'x'"),
        "unknown message reference 'size', expected one of: length"
    );
    assert_eq!(
        compile_err("# @msg ${$expected}\n[1].length > 0 && true"),
        "$expected is not available for this assertion"
    );
}

#[test]
fn limits_block_nesting() {
    let config = CompilerConfig::default().with_max_depth(2);
    let err = compile("mondoo { _ { _ { version } } }", &schema(), &config).unwrap_err();
    assert_eq!(
        err.message,
        "malformed block nesting: blocks nest deeper than 2"
    );
}
