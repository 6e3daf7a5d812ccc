/// Simulated heap behaviour as seen from programs: allocation order,
/// `free`, pointers and the capacity limit
use std::cell::RefCell;
use std::rc::Rc;

use gravox::{Error, Interpreter, InterpreterConfig, Value};

fn interpreter(config: InterpreterConfig) -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    (Interpreter::new(config).with_output(buffer.clone()), buffer)
}

fn output(buffer: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buffer.borrow().clone()).unwrap()
}

#[test]
fn test_addresses_follow_type_sizes() {
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    let source = r#"
        let a: int8 = 1;
        let b: int16 = 2;
        let c: int32 = 3;
        let d: float64 = 4.0;
        let e: char = 'e';
        print(&a, &b, &c, &d, &e, gravox_heapusage());
    "#;
    interp.run_source(source).unwrap();
    assert_eq!(output(&buffer), "0 1 3 7 15 16\n");
}

#[test]
fn test_free_never_reuses_addresses() {
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    let source = r#"
        let a: int32 = 1;
        free a;
        let b: int32 = 2;
        print(&b);
    "#;
    interp.run_source(source).unwrap();
    assert_eq!(output(&buffer), "4\n");
    assert!(!interp.heap().contains(0));
    assert_eq!(interp.heap().read(4).unwrap(), Value::Int(2));
    assert!(interp.get("a").is_none());
}

#[test]
fn test_freed_variable_is_undeclared() {
    let (mut interp, _) = interpreter(InterpreterConfig::default());
    let err = interp
        .run_source("let a: int32 = 1; free a; print(a);")
        .unwrap_err();
    assert_eq!(
        err,
        Error::UndeclaredVariable {
            name: "a".to_string()
        }
    );
}

#[test]
fn test_dereference_of_freed_address_fails() {
    let (mut interp, _) = interpreter(InterpreterConfig::default());
    let err = interp
        .run_source("let a: int32 = 1; let p: int64 = &a; free a; print(*p);")
        .unwrap_err();
    assert_eq!(err, Error::InvalidMemoryAccess { address: 0 });
}

#[test]
fn test_assignment_updates_memory_cell() {
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    interp
        .run_source("let x: int32 = 1; let p: int64 = &x; x = 41; print(*p + 1);")
        .unwrap();
    assert_eq!(output(&buffer), "42\n");
    assert_eq!(interp.heap().read(0).unwrap(), Value::Int(41));
}

#[test]
fn test_capacity_counts_every_declaration() {
    // 2 + 2 bytes fit; the int8 lands on address 4
    let (mut interp, buffer) = interpreter(InterpreterConfig::new().with_heap_size(4));
    let err = interp
        .run_source("let a: int16; let b: int16; print(\"ok\"); let c: int8;")
        .unwrap_err();
    assert_eq!(
        err,
        Error::HeapCapacityExceeded {
            address: 4,
            capacity: 4
        }
    );
    assert_eq!(output(&buffer), "ok\n");
    assert_eq!(interp.heap().live_cells(), 2);
}

#[test]
fn test_parameters_consume_heap() {
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    let source = r#"
        def id(n: int64) -> int64 { return &n; }
        print(id(5), id(5), gravox_heapusage());
    "#;
    interp.run_source(source).unwrap();
    assert_eq!(output(&buffer), "0 8 16\n");
}

#[test]
fn test_repeated_calls_exhaust_default_heap() {
    let source = r#"
        def id(i: int32) -> int32 { return i; }
        let total: int32 = 0;
        for (let i: int32 = 0; i < 300; i = i + 1) { total = total + id(1); }
        print(total);
    "#;
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    let err = interp.run_source(source).unwrap_err();
    assert_eq!(
        err,
        Error::HeapCapacityExceeded {
            address: 1024,
            capacity: 1024
        }
    );
    assert_eq!(output(&buffer), "");

    let (mut interp, buffer) = interpreter(InterpreterConfig::new().with_heap_size(4096));
    interp.run_source(source).unwrap();
    assert_eq!(output(&buffer), "300\n");
}

#[test]
fn test_heap_dump_lists_live_cells() {
    let (mut interp, buffer) = interpreter(InterpreterConfig::default());
    interp
        .run_source("let a: int32 = 7; let b: char = 'z'; free a; print(gravox_heapdump());")
        .unwrap();
    assert_eq!(output(&buffer), "4: z\n\n");
}

#[test]
fn test_error_message_for_capacity() {
    let (mut interp, _) = interpreter(InterpreterConfig::new().with_heap_size(1));
    let err = interp
        .run_source("let a: char = 'a'; let b: char = 'b';")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Segmentation fault: address 1 exceeds heap capacity of 1 bytes"
    );
    assert_eq!(interp.get("a"), Some(&Value::Char('a')));
}
