//! Benchmarks for the qasmlab compile pipeline
//!
//! Run with: cargo bench -p qasmlab-qasm3

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qasmlab_ir::CircuitProgram;
use qasmlab_qasm3::{
    Capabilities, Compiler, CompilerConfig, Expander, convert_to_qasm2, emit, parse_program,
};

fn ghz_source(n: u32) -> String {
    let mut source = format!("OPENQASM 3.0;\nqubit[{n}] q;\nbit[{n}] c;\nh q[0];\n");
    for i in 0..n - 1 {
        source.push_str(&format!("cx q[{i}], q[{}];\n", i + 1));
    }
    source.push_str("c = measure q;\n");
    source
}

fn looped_source(n: u32) -> String {
    format!(
        "OPENQASM 3.0;\nqubit[{n}] q;\nbit[{n}] c;\nh q[0];\nfor int i in [0:{}] {{ cx q[i], q[i + 1]; }}\nc = measure q;\n",
        n - 1
    )
}

/// Benchmark parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for n in &[5, 20, 100] {
        let source = ghz_source(*n);
        group.bench_with_input(BenchmarkId::new("ghz", n), &source, |b, s| {
            b.iter(|| parse_program(black_box(s)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark loop expansion
fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let expander = Expander::default();

    for n in &[5, 20, 100] {
        let program = parse_program(&looped_source(*n)).unwrap();
        group.bench_with_input(BenchmarkId::new("loop", n), &program, |b, p| {
            b.iter(|| expander.expand(black_box(p)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark each compile route end to end
fn bench_compile_routes(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    let direct = Compiler::default();
    let structural = Compiler::new(CompilerConfig {
        capabilities: Capabilities::structural_only(),
        ..CompilerConfig::default()
    });

    let flat = ghz_source(20);
    let looped = looped_source(20);
    let legacy = convert_to_qasm2(&flat);

    group.bench_function("direct", |b| {
        b.iter(|| direct.compile(black_box(&flat)).unwrap());
    });
    group.bench_function("structural", |b| {
        b.iter(|| structural.compile(black_box(&looped)).unwrap());
    });
    group.bench_function("fallback", |b| {
        b.iter(|| direct.compile(black_box(&legacy)).unwrap());
    });

    group.finish();
}

/// Benchmark emission
fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for n in &[5, 20, 100] {
        let program = CircuitProgram::ghz(*n).unwrap();
        group.bench_with_input(BenchmarkId::new("ghz", n), &program, |b, p| {
            b.iter(|| emit(black_box(p)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_expand,
    bench_compile_routes,
    bench_emit
);
criterion_main!(benches);
