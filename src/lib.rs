/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The type checker validates an AST against the scope rules and annotates
/// the resolved type of every captured variable.
pub mod type_checker;

/// The code generator lowers a checked AST into JavaScript source.
pub mod code_gen;

pub mod ast;
pub mod builtins;
pub mod diagnostic;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use crate::{
    diagnostic::{Diagnostic, Reporter},
    token::Spanned,
    type_checker::Checker,
};

/// Pipeline options.
#[derive(Copy, Clone, Debug)]
pub struct Options {
    /// Run the type checker before lowering. Without it, capture types are
    /// left unresolved.
    pub type_check: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { type_check: true }
    }
}

/// The fatal error that stopped a compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] Spanned<parser::Error>),
    #[error(transparent)]
    Type(#[from] Spanned<type_checker::Error>),
}

impl CompileError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Parse(e) => Diagnostic::new(e.inner.to_string(), e.pos),
            CompileError::Type(e) => Diagnostic::new(e.inner.to_string(), e.pos),
        }
    }
}

/// Compiles `src` with the default [`Options`].
pub fn compile(src: &str, reporter: &mut impl Reporter) -> Result<String, CompileError> {
    compile_with(src, Options::default(), reporter)
}

/// Runs the whole pipeline over `src`, returning the generated program.
///
/// Lexical errors are reported and skipped. The first parse or type error is
/// reported and returned, and no code is produced.
pub fn compile_with(
    src: &str,
    options: Options,
    reporter: &mut impl Reporter,
) -> Result<String, CompileError> {
    let tokens = lexer::tokenize(src, reporter);
    run_stages(&tokens, options).inspect_err(|error| reporter.report(&error.diagnostic()))
}

fn run_stages(tokens: &[token::Token], options: Options) -> Result<String, CompileError> {
    let mut program = parser::parse(tokens)?;
    if options.type_check {
        Checker::new().check_program(&mut program)?;
    } else {
        log::debug!("type checking disabled");
    }
    Ok(code_gen::lower_program(&program))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::Position;

    const DEMOS: &[(&str, &str)] = &[
        ("arith", include_str!("../demos/arith.fh")),
        ("closures", include_str!("../demos/closures.fh")),
        ("lists", include_str!("../demos/lists.fh")),
    ];

    #[test]
    fn test_demos_compile() {
        for (name, src) in DEMOS {
            let mut diagnostics: Vec<Diagnostic> = Vec::new();
            let result = compile(src, &mut diagnostics);
            assert!(result.is_ok(), "{name}: {diagnostics:?}");
            assert!(diagnostics.is_empty(), "{name}: {diagnostics:?}");
        }
    }

    #[test]
    fn test_demos_are_deterministic() {
        for (name, src) in DEMOS {
            let first = compile(src, &mut Vec::<Diagnostic>::new()).unwrap();
            let second = compile(src, &mut Vec::<Diagnostic>::new()).unwrap();
            assert!(first == second, "{name}");
        }
    }

    #[test]
    fn test_compile_output() {
        let src = indoc! {"
            var int<int a, int b> add = int<int a, int b> { ret a + b }
            add with (1, 2)
        "};
        let code = compile(src, &mut Vec::<Diagnostic>::new()).unwrap();
        assert!(code.starts_with("const __fs__ = require('fs');\n"));
        assert!(code.ends_with(indoc! {"
            let add = (function add(a, b) {
                return (a() + b());
            });
            add(() => 1, () => 2);
        "}));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let error = compile("var int = x", &mut diagnostics).unwrap_err();
        assert!(matches!(error, CompileError::Parse(_)));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].position, Some(Position::new(1, 9)));
        assert_eq!(diagnostics[0].to_string(), error.to_string());
    }

    #[test]
    fn test_type_error_is_reported() {
        let src = indoc! {"
            var int<> x = int<> { ret 1 }
            var int<> x = int<> { ret 2 }
        "};
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let error = compile(src, &mut diagnostics).unwrap_err();
        assert!(matches!(error, CompileError::Type(_)));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(
                "variable x is already declared in this scope (as int)",
                Position::new(2, 1),
            )]
        );
        assert_eq!((diagnostics[0].line(), diagnostics[0].column()), (2, 1));
    }

    #[test]
    fn test_lex_errors_do_not_abort() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let code = compile("log with ($1)", &mut diagnostics).unwrap();
        assert!(code.ends_with("log(() => 1);\n"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].position, Some(Position::new(1, 11)));
    }

    #[test]
    fn test_type_check_can_be_disabled() {
        let src = "var int x = 1";
        assert!(compile(src, &mut Vec::<Diagnostic>::new()).is_err());

        let options = Options { type_check: false };
        let code = compile_with(src, options, &mut Vec::<Diagnostic>::new()).unwrap();
        assert!(code.ends_with("let x = __value(1);\n"));
    }
}
