/// Lexer and parser failures (plain and structured), and the runtime
/// failure report
use gravox::{parse_source, tokenize, Error, ErrorKind, Interpreter, InterpreterConfig};
use serde_json::json;

fn structured(source: &str) -> serde_json::Value {
    let err = parse_source(source, true).unwrap_err();
    assert!(matches!(err, Error::Diagnostic(_)), "not structured: {:?}", err);
    serde_json::from_str(&err.to_string()).unwrap()
}

#[test]
fn test_unexpected_character() {
    let err = tokenize("let x: int32 = 5 $ 3;", false).unwrap_err();
    assert_eq!(
        err,
        Error::UnexpectedCharacter {
            ch: '$',
            line: 1,
            column: 18
        }
    );
    assert_eq!(err.classify(), ErrorKind::Lexical);

    assert_eq!(
        structured("let x: int32 = 5 $ 3;"),
        json!({ "cause": "unexpect", "char": "$", "loc": { "line": 0, "column": 17 } })
    );
}

#[test]
fn test_unterminated_literals() {
    assert_eq!(
        structured("let s: string = \"abc;"),
        json!({ "cause": "string", "loc": { "line": 0, "column": 16 } })
    );
    assert_eq!(
        structured("\nlet c: char = 'ab';"),
        json!({ "cause": "char", "loc": { "line": 1, "column": 14 } })
    );
    assert_eq!(
        structured("let f: float64 = 1.2.3;"),
        json!({ "cause": "number", "char": "1.2.3", "loc": { "line": 0, "column": 17 } })
    );
}

#[test]
fn test_parser_failure_names_rule() {
    let err = parse_source("let x int32;", false).unwrap_err();
    assert_eq!(err.to_string(), "Expected COLON, got DATA_TYPE at 1:7");
    assert_eq!(err.classify(), ErrorKind::Syntax);

    let payload = structured("let x int32;");
    assert_eq!(
        payload,
        json!({
            "fn": "let",
            "expect": "COLON",
            "got": "DATA_TYPE",
            "loc": { "line": 0, "column": 6 }
        })
    );
}

#[test]
fn test_parser_failures_in_blocks() {
    let payload = structured("def f() -> int32 {\n  return 1\n}");
    assert_eq!(payload["fn"], "return");
    assert_eq!(payload["expect"], "SEMICOLON");
    assert_eq!(payload["loc"]["line"], 2);

    let payload = structured("struct S { a int8; }");
    assert_eq!(payload["fn"], "struct");

    let payload = structured("spawn worker() {}");
    assert_eq!(payload["fn"], "spawn");
    assert_eq!(payload["expect"], "task");
}

#[test]
fn test_runtime_errors_have_no_payload() {
    assert_eq!(Error::DivisionByZero.to_diagnostic(), None);
    assert_eq!(Error::DivisionByZero.classify(), ErrorKind::Runtime);
    let err = Error::DivisionByZero.structured(true);
    assert_eq!(err, Error::DivisionByZero);
}

#[test]
fn test_report_counts_statements() {
    let mut interpreter = Interpreter::new(InterpreterConfig::default())
        .with_output(std::rc::Rc::new(std::cell::RefCell::new(Vec::<u8>::new())));
    let err = interpreter
        .run_source("let a: int32 = 1;\nprint(a);\nlet b: int32 = a / 0;")
        .unwrap_err();
    assert_eq!(interpreter.step(), 3);
    assert_eq!(
        interpreter.report(&err),
        "error at 3 (let b: int32 = (a / 0)): Division by zero"
    );
}

#[test]
fn test_report_names_innermost_statement() {
    let mut interpreter = Interpreter::new(InterpreterConfig::default());
    let err = interpreter
        .run_source("def f(n: int32) -> int32 { return n % 0; }\nlet r: int32 = f(1);")
        .unwrap_err();
    assert_eq!(err, Error::ModuloByZero);
    assert_eq!(interpreter.last_node(), "return (n % 0)");
    assert_eq!(
        interpreter.report(&err),
        "error at 3 (return (n % 0)): Modulo by zero"
    );
}
