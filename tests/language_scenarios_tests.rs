/// End-to-end scenarios: source text through scanner, parser and interpreter
use std::cell::RefCell;
use std::rc::Rc;

use gravox::{Error, Interpreter, InterpreterConfig, Parser, Scanner, Value};

fn run_with(source: &str, config: InterpreterConfig) -> (gravox::Result<Value>, String) {
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let mut interpreter = Interpreter::new(config).with_output(buffer.clone());

    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan_tokens().expect("scan");
    let mut parser = Parser::new(tokens);
    let program = parser.parse().expect("parse");

    let result = interpreter.execute(&program);
    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    (result, output)
}

fn run(source: &str) -> (gravox::Result<Value>, String) {
    run_with(source, InterpreterConfig::default())
}

#[test]
fn test_declare_then_reassign() {
    let (result, output) = run("let x: int32 = 5; x = x + 1; print(x);");
    assert_eq!(result.unwrap(), Value::Null);
    assert_eq!(output, "6\n");
}

#[test]
fn test_division_by_zero_fails() {
    let (result, output) = run("let x: int32 = 5 / 0;");
    assert_eq!(result.unwrap_err(), Error::DivisionByZero);
    assert_eq!(output, "");
}

#[test]
fn test_struct_field_roundtrip() {
    let (result, output) =
        run("struct Point { x: int32; y: int32; } let p: Point; p.x = 3; print(p.x);");
    result.unwrap();
    assert_eq!(output, "3\n");
}

#[test]
fn test_heap_capacity_of_four_chars() {
    let source = r#"
        let a: char = 'a';
        let b: char = 'b';
        let c: char = 'c';
        let d: char = 'd';
        print(a, b, c, d);
        let e: char = 'e';
        print("unreachable");
    "#;
    let (result, output) = run_with(source, InterpreterConfig::new().with_heap_size(4));
    assert_eq!(
        result.unwrap_err(),
        Error::HeapCapacityExceeded {
            address: 4,
            capacity: 4
        }
    );
    assert_eq!(output, "a b c d\n");
}

#[test]
fn test_try_catch_continues() {
    let (result, output) =
        run(r#"try { let x: int32 = 1 / 0; } catch { print("caught"); } print("next");"#);
    result.unwrap();
    assert_eq!(output, "caught\nnext\n");
}

#[test]
fn test_enum_member_prints_its_name() {
    let (result, output) = run("enum Color { Red, Green, Blue, } print(Color.Red);");
    result.unwrap();
    assert_eq!(output, "Red\n");
}

#[test]
fn test_fibonacci_program() {
    let source = r#"
        def fib(n: int32) -> int32 {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        let out: array = [];
        for (let i: int32 = 0; i < 10; i = i + 1) {
            out = out + [fib(i)];
        }
        print(out);
        return fib(15);
    "#;
    let (result, output) = run(source);
    assert_eq!(result.unwrap(), Value::Int(610));
    assert_eq!(output, "[0, 1, 1, 2, 3, 5, 8, 13, 21, 34]\n");
}

#[test]
fn test_string_building() {
    let source = r#"
        let name: string = "grav";
        name = name + "ox";
        let c: char = 'v';
        print(name + " " + c + 1, len(name));
    "#;
    let (result, output) = run(source);
    result.unwrap();
    assert_eq!(output, "gravox v1 6\n");
}

#[test]
fn test_casts() {
    let source = r#"
        let f: float64 = 2.75;
        print(<int32> f, <string> 12 + "!", <float32> 3, <int64> "41" + 1);
    "#;
    let (result, output) = run(source);
    result.unwrap();
    assert_eq!(output, "2 12! 3.0 42\n");
}

#[test]
fn test_failed_cast_is_reported() {
    let (result, _) = run(r#"let n: int32 = "seven";"#);
    assert_eq!(
        result.unwrap_err(),
        Error::TypeCast {
            value: "seven".to_string(),
            target: "int32".to_string()
        }
    );
}

#[test]
fn test_ampersand_and_star_by_position() {
    let source = r#"
        let a: int32 = 6;
        let b: int32 = 3;
        let p: int64 = &a;
        print(a & b, a * *p, *p * b, &b);
    "#;
    let (result, output) = run(source);
    result.unwrap();
    assert_eq!(output, "2 36 18 4\n");
}

#[test]
fn test_plain_struct_format() {
    let source = "struct P { x: int32; y: int32; } let p: P; p.y = 2; print(p);";
    let (result, output) = run_with(
        source,
        InterpreterConfig::new().with_format(gravox::Format::Plain),
    );
    result.unwrap();
    assert_eq!(output, "{x: 0, y: 2}\n");

    let (_, pretty) = run(source);
    assert_eq!(pretty, "P { x: 0, y: 2 }\n");
}

#[test]
fn test_spawn_runs_inline() {
    let source = r#"
        print("before");
        spawn task worker(n: int32) { print("in task"); }
        print("after");
    "#;
    let (result, output) = run(source);
    result.unwrap();
    assert_eq!(output, "before\nin task\nafter\n");
}

#[test]
fn test_run_source_helper() {
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let result = gravox::run_source(
        "print(1 + 2); return 7;",
        InterpreterConfig::default(),
        buffer.clone(),
    );
    assert_eq!(result.unwrap(), Value::Int(7));
    assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "3\n");
}
