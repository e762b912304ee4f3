use criterion::{criterion_group, criterion_main, Criterion};
use fh::{diagnostic::Diagnostic, lexer, parser, type_checker::Checker};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/closures.fh");

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = lexer::tokenize(INPUT, &mut Vec::<Diagnostic>::new());

    c.bench_function("parse", |b| {
        b.iter(|| parser::parse(black_box(&tokens)).map(|program| program.body.len()));
    });
    c.bench_function("parse and check", |b| {
        b.iter(|| {
            let Ok(mut program) = parser::parse(black_box(&tokens)) else {
                return false;
            };
            Checker::new().check_program(&mut program).is_ok()
        });
    });
    c.bench_function("compile", |b| {
        b.iter(|| fh::compile(black_box(INPUT), &mut Vec::<Diagnostic>::new()).map(|code| code.len()));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
