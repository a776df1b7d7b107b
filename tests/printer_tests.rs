mod common;

use insta::assert_snapshot;
use mql::{assess, printer};

use common::run;

fn print(source: &str) -> String {
    let (bundle, execution) = run(source);
    printer::results(&bundle, &execution)
}

#[test]
fn failed_comparison_shows_expected_and_actual() {
    assert_snapshot!(print("mondoo.build == 1"), @r#"
    [failed] mondoo.build == 1
      expected: == 1
      actual:   "development"
    "#);
}

#[test]
fn compound_assessment_reports_every_clause() {
    assert_snapshot!(print("mondoo.build == 1; mondoo.version == 'unstable'"), @r#"
    [failed] mondoo.build == 1; mondoo.version == 'unstable'
      [failed] mondoo.build == 1
        expected: == 1
        actual:   "development"
      [ok] value: "unstable"
    "#);
}

#[test]
fn data_next_to_assertions_is_assessed_too() {
    assert_snapshot!(print("mondoo.build == 1; user(name: 'notthere').home"), @r#"
    [failed] mondoo.build == 1; user(name: 'notthere').home
      [failed] mondoo.build == 1
        expected: == 1
        actual:   "development"
      [failed] user.home
        error: user not found: 'notthere' does not exist
    "#);
    assert_snapshot!(print("mondoo.build == 1; sshd.config"), @r#"
    [failed] mondoo.build == 1; sshd.config
      [failed] mondoo.build == 1
        expected: == 1
        actual:   "development"
      [ok] value: sshd.config id = /etc/ssh/sshd_config
    "#);
}

#[test]
fn failed_quantifier_lists_offending_items() {
    assert_snapshot!(print("users.all(uid < 1000)"), @r"
    [failed] users.all()
      actual:   [
        0: user {
          uid: 1000
        }
        1: user {
          uid: 1000
        }
        2: user {
          uid: 1002
        }
      ]
    ");
    assert_snapshot!(print("users.none('/root' == home); users.all(name != 'root')"), @r#"
    [failed] users.none('/root' == home); users.all(name != 'root')
      [failed] users.none()
        actual:   [
          0: user {
            home: "/root"
          }
        ]
      [failed] users.all()
        actual:   [
          0: user {
            name: "root"
          }
        ]
    "#);
}

#[test]
fn failed_any_shows_the_whole_list() {
    assert_snapshot!(print("users.any(name == 'nobody')"), @r"
    [failed] users.any()
      actual:   [
        0: user id = root
        1: user id = bin
        2: user id = chris
        3: user id = christopher
        4: user id = paul
      ]
    ");
}

#[test]
fn custom_messages_replace_details() {
    assert_eq!(
        print("# @msg Found ${length} numbers\n[1,2,3].none(_ > 1)"),
        "[failed] Found 2 numbers\n"
    );
    assert_eq!(
        print("# @msg Expected ${$expected.length} users but got ${length}\nusers.none(uid == 0)"),
        "[failed] Expected 5 users but got 1\n"
    );
}

#[test]
fn custom_messages_inside_blocks() {
    assert_snapshot!(
        print("if(true) {\n  # @msg Expected ${$expected.length} users but got ${length}\n  users.none( uid == 0 )\n}"),
        @r"
    if: {
      [failed] Expected 5 users but got 1
    }
    "
    );
    assert_snapshot!(
        print("if(true) {\n  # @msg Found a system user\n  users.all( uid >= 0 )\n}"),
        @r"
    if: {
      users.all(): true
    }
    "
    );
}

#[test]
fn passing_assertions_print_ok() {
    let (bundle, execution) = run("users.all(uid >= 0); mondoo.version == 'unstable'");
    let assessment = assess(&bundle, &execution).unwrap();
    assert!(assessment.success);
    assert!(assessment.results.iter().all(|item| item.message.is_none()));
}

#[test]
fn results_without_assertions_print_values() {
    assert_snapshot!(print("sshd.config { params['test'] }"), @r"
    sshd.config: {
      params[test]: null
    }
    ");
    assert_snapshot!(print("a = 3\nif(true) {\n  a == 3\n}"), @r"
    if: {
      a == 3: true
    }
    ");
    assert_snapshot!(print("['1-2'] { _.split('-') }"), @r#"
    [
      0: {
        split: [
          0: "1"
          1: "2"
        ]
      }
    ]
    "#);
    assert_eq!(print("[]"), "[]");
    assert_eq!(print("{}"), "{}");
    assert_eq!(print("[1, 2, 3][0]"), "1");
}

#[test]
fn maps_and_resources_render_nested() {
    assert_snapshot!(print("sshd.config.params"), @r#"
    sshd.config.params: {
      PermitRootLogin: "no"
      Port: "22"
      UsePAM: "yes"
    }
    "#);
    assert_snapshot!(print("users.where(uid == 1000)"), @r"
    users.where: [
      0: user id = chris
      1: user id = christopher
    ]
    ");
}
