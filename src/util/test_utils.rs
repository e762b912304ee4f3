use crate::{
    diagnostic::Diagnostic, lexer, parser, token::Token, type_checker::Checker,
    util::fmt::tree,
};

/// Each variant contains the (dedented) input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    CheckerProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

fn tokenize(input: &str) -> (Vec<Token>, Vec<String>) {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let tokens = lexer::tokenize(input, &mut diagnostics);
    let errors = diagnostics.iter().map(ToString::to_string).collect();
    (tokens, errors)
}

/// Runs the pipeline up to the stage under test. Returns the printed tree (empty
/// if the stage failed) and every formatted error.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    match test {
        Test::ParserProgram(input) => {
            let (tokens, mut errors) = tokenize(input);
            match parser::parse(&tokens) {
                Ok(program) => (tree::print_program_string(&program), errors),
                Err(error) => {
                    errors.push(error.to_string());
                    (String::new(), errors)
                }
            }
        }
        Test::ParserExpr(input) => {
            let (tokens, mut errors) = tokenize(input);
            match parser::parse_expr(&tokens) {
                Ok(expr) => (tree::print_expr_string(&expr), errors),
                Err(error) => {
                    errors.push(error.to_string());
                    (String::new(), errors)
                }
            }
        }
        Test::CheckerProgram(input) => {
            let (tokens, mut errors) = tokenize(input);
            let mut program = match parser::parse(&tokens) {
                Ok(program) => program,
                Err(error) => {
                    errors.push(error.to_string());
                    return (String::new(), errors);
                }
            };
            if let Err(error) = Checker::new().check_program(&mut program) {
                errors.push(error.to_string());
            }
            (tree::print_program_string(&program), errors)
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim())
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors)
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:literal;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), ::indoc::indoc! { $source });
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(checker, program), $source:expr) => {
        crate::util::test_utils::Test::CheckerProgram($source)
    };
}
pub(crate) use tree_tests;
