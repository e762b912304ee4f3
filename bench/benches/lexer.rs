use criterion::{criterion_group, criterion_main, Criterion};
use fh::{diagnostic::Diagnostic, lexer, token::Token};
use std::hint::black_box;

static INPUTS: &[(&str, &str)] = &[
    ("arith", include_str!("../../demos/arith.fh")),
    ("closures", include_str!("../../demos/closures.fh")),
    ("lists", include_str!("../../demos/lists.fh")),
];

fn lex_reusing_buffer(input: &str, tokens: &mut Vec<Token>) {
    tokens.clear();
    lexer::lex(input, tokens, &mut Vec::<Diagnostic>::new());
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for (name, input) in INPUTS {
        group.bench_function(*name, |b| {
            b.iter(|| lexer::tokenize(black_box(input), &mut Vec::<Diagnostic>::new()));
        });
    }
    let all = INPUTS.iter().map(|(_, input)| *input).collect::<Vec<_>>().join("\n");
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    group.bench_function("all, reused buffer", |b| {
        b.iter(|| lex_reusing_buffer(black_box(&all), &mut tokens));
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
