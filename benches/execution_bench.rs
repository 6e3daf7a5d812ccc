use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gravox::{Interpreter, InterpreterConfig, Parser, Scanner};

const PROGRAM: &str = r#"
    struct Point { x: int32; y: int32; }
    def fib(n: int32) -> int32 {
        if (n < 2) { return n; }
        return fib(n - 1) + fib(n - 2);
    }
    let p: Point = Point { x: 3, y: 4 };
    let total: int64 = 0;
    for (let i: int32 = 0; i < 20; i = i + 1) {
        total = total + i * p.x % 7;
    }
    print(total, fib(12));
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize program", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(black_box(PROGRAM));
            scanner.scan_tokens().unwrap()
        })
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = Scanner::new(PROGRAM).scan_tokens().unwrap();

    c.bench_function("parse program", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box(tokens.clone()));
            parser.parse().unwrap()
        })
    });
}

fn execution_benchmark(c: &mut Criterion) {
    let program = Parser::new(Scanner::new(PROGRAM).scan_tokens().unwrap())
        .parse()
        .unwrap();
    let config = InterpreterConfig::new().with_heap_size(1 << 20);

    c.bench_function("execute program", |b| {
        b.iter(|| {
            let sink = Rc::new(RefCell::new(Vec::<u8>::new()));
            let mut interpreter = Interpreter::new(config.clone()).with_output(sink);
            interpreter.execute(black_box(&program)).unwrap()
        })
    });
}

criterion_group!(benches, lexer_benchmark, parser_benchmark, execution_benchmark);
criterion_main!(benches);
