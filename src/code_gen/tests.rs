use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::{diagnostic::Diagnostic, lexer, parser, type_checker::Checker};

fn parse(src: &str) -> Program {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let tokens = lexer::tokenize(src, &mut diagnostics);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    parser::parse(&tokens).expect("failed to parse")
}

/// Lowers `src` and returns the code after the prelude.
fn lower_body(src: &str, type_check: bool) -> String {
    let mut program = parse(src);
    if type_check {
        Checker::new()
            .check_program(&mut program)
            .expect("failed to type check");
    }
    let prelude = lower_program(&Program::default());
    let code = lower_program(&program);
    code.strip_prefix(&prelude)
        .expect("missing prelude")
        .to_owned()
}

#[test]
fn test_prelude() {
    let code = lower_program(&Program::default());
    assert!(code.starts_with(indoc! {"
        const __fs__ = require('fs');
        var __value = (v) => () => v;
        var fileRead = (path) => __fs__.readFileSync(path(), 'utf8');
    "}));
    for builtin in builtins::ALL {
        assert!(code.contains(&format!("{}\n", builtin.prelude)), "{}", builtin.name);
    }
    assert_eq!(code.lines().count(), builtins::PRELUDE_HEADER.len() + builtins::ALL.len());
}

#[test]
fn test_function_declaration_and_call() {
    let body = lower_body(
        indoc! {"
            var int<int a, int b> add = int<int a, int b> { ret a + b }
            add with (1, 2)
        "},
        true,
    );
    assert_eq!(
        body,
        indoc! {"
            let add = (function add(a, b) {
                return (a() + b());
            });
            add(() => 1, () => 2);
        "}
    );
}

#[test]
fn test_conditionals() {
    let body = lower_body(
        indoc! {"
            var int<int n> sign = int<int n> {
                if (n < 0) {
                    ret -1
                } else if (n == 0) {
                    ret 0
                }
                ret 1
            }
        "},
        true,
    );
    assert_eq!(
        body,
        indoc! {"
            let sign = (function sign(n) {
                if (n() < 0) {
                    return (-1);
                } else {
                    if ((n() == 0)) {
                        return 0;
                    };
                };
                return 1;
            });
        "}
    );
}

#[test]
fn test_operators() {
    let body = lower_body(
        indoc! {"
            var bool<bool a, bool b> f = bool<bool a, bool b> { ret a and !b or false }
            var float<float x> g = float<float x> { ret x * 2.5 % 2.0 - 1 }
            var bool<int x> h = bool<int x> { ret x != 1 or x >= 3 }
        "},
        true,
    );
    assert_eq!(
        body,
        indoc! {"
            let f = (function f(a, b) {
                return (a() && (!(b() || false)));
            });
            let g = (function g(x) {
                return (((x() * 2.5) % 2.0) - 1);
            });
            let h = (function h(x) {
                return (x() != 1 || x() >= 3);
            });
        "}
    );
}

#[test]
fn test_bound_values() {
    let body = lower_body(
        indoc! {r#"
            var int<> one = int<> { ret 1 }
            var int alias = one
            one = alias
            names = string { "a", "b" }
        "#},
        false,
    );
    assert_eq!(
        body,
        indoc! {r#"
            let one = (function one() {
                return 1;
            });
            let alias = __value(one());
            one = __value(alias());
            names = __value(["a", "b"]);
        "#}
    );
}

#[test]
fn test_captures_and_anonymous_functions() {
    let body = lower_body(
        indoc! {"
            var int<> one = int<> { ret 1 }
            var void<> run = void<> {
                log with (^one, int<int x> { ret x })
            }
        "},
        true,
    );
    assert_eq!(
        body,
        indoc! {"
            let one = (function one() {
                return 1;
            });
            let run = (function run() {
                log(() => one(), () => (function (x) {
                    return x();
                }));
            });
        "}
    );
}

#[test]
fn test_lowering_is_deterministic() {
    let mut program = parse(include_str!("../../demos/closures.fh"));
    Checker::new().check_program(&mut program).unwrap();
    assert_eq!(lower_program(&program), lower_program(&program));
    assert_eq!(program.lower(), lower_program(&program));
}

#[test]
fn test_lower_single_nodes() {
    let tokens = lexer::tokenize("a + b * c", &mut Vec::<Diagnostic>::new());
    let expr = parser::parse_expr(&tokens).unwrap();
    assert_eq!(expr.lower(), "(a() + (b() * c()))");

    let program = parse("ret");
    assert_eq!(program.body[0].lower(), "return");
}
