use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use fh::{
    diagnostic::{Diagnostic, Reporter},
    lexer, parser, Options,
};

/// Compiles a source file into a JavaScript program.
#[derive(Parser, Debug)]
#[command(name = "fhc", version, about)]
struct Cli {
    /// Source file to compile.
    input: PathBuf,

    /// Where to write the generated program.
    #[arg(short, long, default_value = "output.js")]
    output: PathBuf,

    /// Print the token stream before compiling.
    #[arg(long)]
    print_tokens: bool,

    /// Print the parsed tree before compiling.
    #[arg(long)]
    print_ast: bool,

    /// Lower the program without type checking it.
    #[arg(long)]
    no_type_check: bool,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(cli.verbose.log_level_filter());
    }

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            let mut reporter = Renderer {
                path: &cli.input,
                src: "",
            };
            reporter.report(&Diagnostic::positionless(format!("{error:#}")));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let mut reporter = Renderer {
        path: &cli.input,
        src: &src,
    };

    if cli.print_tokens || cli.print_ast {
        let tokens = lexer::tokenize(&src, &mut Vec::<Diagnostic>::new());
        if cli.print_tokens {
            for token in &tokens {
                println!("{token:?}");
            }
        }
        if cli.print_ast {
            match parser::parse(&tokens) {
                Ok(program) => print!("{}", program.describe()),
                Err(error) => {
                    reporter.report(&Diagnostic::new(error.inner.to_string(), error.pos));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    let options = Options {
        type_check: !cli.no_type_check,
    };
    let Ok(code) = fh::compile_with(&src, options, &mut reporter) else {
        return Ok(ExitCode::FAILURE);
    };

    fs::write(&cli.output, code)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("wrote {}", cli.output.display());
    Ok(ExitCode::SUCCESS)
}

/// Prints each diagnostic with the offending source line and a caret under
/// its column.
struct Renderer<'a> {
    path: &'a Path,
    src: &'a str,
}

impl Reporter for Renderer<'_> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        eprintln!("error: {}", diagnostic.message);
        let Some(pos) = diagnostic.position else {
            return;
        };
        eprintln!("  --> {}:{pos}", self.path.display());

        let index = (pos.line as usize).saturating_sub(1);
        let Some(line) = self.src.lines().nth(index) else {
            return;
        };
        let gutter = pos.line.to_string();
        let width = gutter.len();
        eprintln!("{:width$} |", "");
        eprintln!("{gutter} | {line}");
        eprintln!("{:width$} | {:>col$}", "", "^", col = pos.column as usize);
    }
}

static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}
