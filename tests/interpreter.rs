use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use tansy::{
    diagnostics::DiagnosticKind,
    value::{Value, ValueKind},
    HostRegistry, Interpreter, TansyError,
};

fn eval(source: &str) -> Value {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> TansyError {
    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

fn expect_kind(source: &str, kind: DiagnosticKind) {
    let err = eval_error(source);
    assert_eq!(err.kind(), Some(kind), "{err}");
}

fn expect_int(value: &Value) -> i64 {
    match value.0.as_ref() {
        ValueKind::Int(n) => *n,
        _ => panic!("expected Int, found {}", value.type_name()),
    }
}

fn expect_float(value: &Value) -> f64 {
    match value.0.as_ref() {
        ValueKind::Float(f) => *f,
        _ => panic!("expected Float, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match value.0.as_ref() {
        ValueKind::Bool(b) => *b,
        _ => panic!("expected Bool, found {}", value.type_name()),
    }
}

fn expect_string(value: &Value) -> String {
    match value.0.as_ref() {
        ValueKind::String(s) => s.clone(),
        _ => panic!("expected String, found {}", value.type_name()),
    }
}

#[test]
fn evaluates_basic_arithmetic() {
    let value = eval("2 + 2");
    assert_eq!(expect_int(&value), 4);
}

#[test]
fn integer_arithmetic_stays_int() {
    assert_eq!(expect_int(&eval("7 / 2")), 3);
    assert_eq!(expect_int(&eval("7 % 2")), 1);
    assert_eq!(expect_int(&eval("6 * 7")), 42);
}

#[test]
fn float_operand_promotes_result() {
    assert_eq!(expect_float(&eval("1 + 2.5")), 3.5);
    assert_eq!(expect_float(&eval("7.0 / 2")), 3.5);
}

#[test]
fn division_by_zero_is_runtime_error() {
    expect_kind("1 / 0", DiagnosticKind::Runtime);
    expect_kind("1 % 0", DiagnosticKind::Runtime);
}

#[test]
fn string_concatenation_with_plus() {
    let value = eval(r#""tan" + "sy""#);
    assert_eq!(expect_string(&value), "tansy");
}

#[test]
fn arithmetic_type_mismatch_is_not_coerced() {
    expect_kind(r#"1 + "one""#, DiagnosticKind::TypeMismatch);
    expect_kind(r#""a" < "b""#, DiagnosticKind::TypeMismatch);
}

#[test]
fn equality_is_strict_per_variant() {
    assert!(expect_bool(&eval("1 == 1")));
    assert!(!expect_bool(&eval("1 == 1.0")));
    assert!(expect_bool(&eval("1 != 1.0")));
    assert!(expect_bool(&eval("[1, 2] == [1, 2]")));
}

#[test]
fn comparison_promotes_numerics() {
    assert!(expect_bool(&eval("1 < 1.5")));
    assert!(expect_bool(&eval("2.0 >= 2")));
}

#[test]
fn statements_without_result_yield_null() {
    let value = eval("let x = 1");
    assert!(matches!(value.0.as_ref(), ValueKind::Null));
}

#[test]
fn script_yields_last_expression_value() {
    let value = eval(
        r#"
        let x = 40
        x + 2
        "#,
    );
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn assignment_requires_existing_binding() {
    expect_kind("x = 1", DiagnosticKind::UndefinedIdentifier);
}

#[test]
fn assignment_mutates_enclosing_scope() {
    let value = eval(
        r#"
        let x = 1
        {
            x = 2
        }
        x
        "#,
    );
    assert_eq!(expect_int(&value), 2);
}

#[test]
fn block_bindings_are_discarded() {
    expect_kind(
        r#"
        {
            let y = 1
        }
        y
        "#,
        DiagnosticKind::UndefinedIdentifier,
    );
}

#[test]
fn let_shadows_without_touching_outer_binding() {
    let value = eval(
        r#"
        let x = 1
        {
            let x = 2
            x = 3
        }
        x
        "#,
    );
    assert_eq!(expect_int(&value), 1);
}

#[test]
fn closure_resolves_against_defining_scope() {
    let value = eval(
        r#"
        let greeting = "hello"
        fn make() {
            let suffix = "!"
            return fn() {
                return greeting + suffix
            }
        }
        let f = make()
        let suffix = "?"
        f()
        "#,
    );
    assert_eq!(expect_string(&value), "hello!");
}

#[test]
fn call_with_wrong_arity_is_rejected() {
    expect_kind(
        r#"
        fn add(a, b) {
            return a + b
        }
        add(2)
        "#,
        DiagnosticKind::ArityMismatch,
    );
    expect_kind(
        r#"
        fn add(a, b) {
            return a + b
        }
        add(1, 2, 3)
        "#,
        DiagnosticKind::ArityMismatch,
    );
}

#[test]
fn call_binds_parameters_positionally() {
    let value = eval(
        r#"
        fn add(a, b) {
            return a + b
        }
        add(2, 3)
        "#,
    );
    assert_eq!(expect_int(&value), 5);
}

#[test]
fn lambda_values_are_callable() {
    let value = eval(
        r#"
        let double = fn(x) {
            return x * 2
        }
        double(21)
        "#,
    );
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn return_stops_at_function_boundary() {
    let value = eval(
        r#"
        fn first() {
            return 1
            return 2
        }
        first() + 10
        "#,
    );
    assert_eq!(expect_int(&value), 11);
}

#[test]
fn break_carries_value_out_of_loop() {
    let value = eval(
        r#"
        loop {
            break 7
        }
        "#,
    );
    assert_eq!(expect_int(&value), 7);
}

#[test]
fn break_outside_loop_is_rejected() {
    expect_kind("break", DiagnosticKind::Runtime);
    expect_kind("continue", DiagnosticKind::Runtime);
}

#[test]
fn loop_signals_never_escape_a_call() {
    expect_kind(
        r#"
        while true {
            fn inner() {
                break
            }
            inner()
        }
        "#,
        DiagnosticKind::Runtime,
    );
}

#[test]
fn while_loop_with_continue() {
    let value = eval(
        r#"
        let sum = 0
        let n = 0
        while n < 10 {
            n = n + 1
            if n % 2 == 0 {
                continue
            }
            sum = sum + n
        }
        sum
        "#,
    );
    assert_eq!(expect_int(&value), 25);
}

#[test]
fn for_loop_accumulates_sum() {
    let value = eval(
        r#"
        let sum = 0
        for item in [1, 2, 3, 4] {
            sum = sum + item
        }
        sum
        "#,
    );
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn map_field_assignment_updates_value() {
    let value = eval(
        r#"
        let inventory = {
            "apples": 3,
            "bananas": 7
        }
        inventory.bananas = inventory.bananas + 5
        inventory.bananas
        "#,
    );
    assert_eq!(expect_int(&value), 12);
}

#[test]
fn array_element_assignment_updates_value() {
    let value = eval(
        r#"
        let numbers = [1, 2, 3]
        numbers[1] = numbers[1] + 5
        numbers
        "#,
    );
    match value.0.as_ref() {
        ValueKind::Array(values) => {
            assert_eq!(values.len(), 3);
            assert_eq!(expect_int(&values[1]), 7);
        }
        _ => panic!("expected Array, found {}", value.type_name()),
    }
}

#[test]
fn nested_index_assignment_writes_back() {
    let value = eval(
        r#"
        let grid = [[1, 2], [3, 4]]
        grid[1][0] = 30
        grid[1][0]
        "#,
    );
    assert_eq!(expect_int(&value), 30);
}

#[test]
fn map_index_with_int_key() {
    let value = eval(
        r#"
        let scores = { 1: "one", 2: "two" }
        scores[2]
        "#,
    );
    assert_eq!(expect_string(&value), "two");
}

#[test]
fn recursive_function_evaluates() {
    let value = eval(
        r#"
        fn fib(n) {
            if n <= 1 {
                return n
            }
            return fib(n - 1) + fib(n - 2)
        }

        fib(6)
        "#,
    );
    assert_eq!(expect_int(&value), 8);
}

#[test]
fn undefined_identifier_is_reported() {
    expect_kind("missing", DiagnosticKind::UndefinedIdentifier);
}

#[test]
fn unknown_host_symbol_is_reported() {
    expect_kind("fmt.frobnicate", DiagnosticKind::UnknownHostSymbol);
    expect_kind("math.tau", DiagnosticKind::UnknownHostSymbol);
}

#[test]
fn host_arity_is_enforced() {
    expect_kind("math.abs(1, 2)", DiagnosticKind::ArityMismatch);
}

#[test]
fn host_argument_types_are_enforced() {
    expect_kind(r#"math.abs("one")"#, DiagnosticKind::TypeMismatch);
}

#[test]
fn host_side_failure_is_catchable() {
    expect_kind(
        r#"fs.read_text("/definitely/not/here.tn")"#,
        DiagnosticKind::HostCallFailure,
    );
}

#[test]
fn cast_converts_explicitly() {
    assert_eq!(expect_int(&eval(r#"rt.cast("42", "Int")"#)), 42);
    assert_eq!(expect_int(&eval(r#"rt.cast(3.9, "Int")"#)), 3);
    assert_eq!(expect_float(&eval(r#"rt.cast(1, "Float")"#)), 1.0);
    assert_eq!(expect_string(&eval(r#"rt.cast(42, "String")"#)), "42");
    assert!(expect_bool(&eval(r#"rt.cast("x", "Bool")"#)));
    expect_kind(r#"rt.cast("not a number", "Int")"#, DiagnosticKind::HostCallFailure);
}

#[test]
fn type_of_reports_variant_names() {
    assert_eq!(expect_string(&eval("rt.type_of(1)")), "Int");
    assert_eq!(expect_string(&eval("rt.type_of(null)")), "Null");
    assert_eq!(expect_string(&eval("rt.type_of(fmt.println)")), "Function");
}

#[test]
fn host_constants_resolve() {
    assert_eq!(expect_string(&eval("sys.os")), std::env::consts::OS);
    assert_eq!(expect_float(&eval("math.pi")), std::f64::consts::PI);
}

#[test]
fn host_value_round_trips() {
    let value = eval("time.unix_epoch");
    match value.0.as_ref() {
        ValueKind::Host(host) => {
            assert_eq!(host.tag, "SystemTime");
            let instant = host
                .downcast::<SystemTime>()
                .expect("downcast should succeed");
            assert_eq!(*instant, UNIX_EPOCH);
        }
        _ => panic!("expected Host, found {}", value.type_name()),
    }
}

#[test]
fn custom_registry_round_trips_opaque_values() {
    #[derive(Debug, PartialEq, Eq)]
    struct SessionKey(u64);

    let mut registry = HostRegistry::new();
    registry.register_constants(
        "app",
        vec![("key", Value::host("SessionKey", Rc::new(SessionKey(42))))],
    );
    let mut interpreter = Interpreter::with_registry(Rc::new(registry));
    let value = interpreter
        .eval_source("app.key")
        .expect("constant should resolve");
    match value.0.as_ref() {
        ValueKind::Host(host) => {
            assert_eq!(host.downcast::<SessionKey>(), Some(&SessionKey(42)));
        }
        _ => panic!("expected Host, found {}", value.type_name()),
    }
}

#[test]
fn registration_is_last_write_wins() {
    let mut registry = HostRegistry::new();
    registry.register_constants("app", vec![("limit", Value::int(1))]);
    registry.register_constants("app", vec![("limit", Value::int(2))]);
    let mut interpreter = Interpreter::with_registry(Rc::new(registry));
    let value = interpreter
        .eval_source("app.limit")
        .expect("constant should resolve");
    assert_eq!(expect_int(&value), 2);
}

#[test]
fn run_folds_failures_into_error_values() {
    let mut interpreter = Interpreter::new();

    let value = interpreter.run("nope");
    match value.0.as_ref() {
        ValueKind::Error(diag) => assert_eq!(diag.kind, DiagnosticKind::UndefinedIdentifier),
        _ => panic!("expected Error, found {}", value.type_name()),
    }

    let value = interpreter.run("let = 3");
    match value.0.as_ref() {
        ValueKind::Error(diag) => assert_eq!(diag.kind, DiagnosticKind::Parser),
        _ => panic!("expected Error, found {}", value.type_name()),
    }

    let value = interpreter.run("40 + 2");
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn unterminated_string_is_a_lexer_error() {
    expect_kind(r#"let s = "no closing quote"#, DiagnosticKind::Lexer);
}

#[test]
fn parse_errors_abort_before_evaluation() {
    expect_kind(
        r#"
        let x = 1
        let = oops
        "#,
        DiagnosticKind::Parser,
    );
}

#[test]
fn strings_and_collections_helpers() {
    assert_eq!(
        expect_string(&eval(r#"strings.join(["a", "b", "c"], "-")"#)),
        "a-b-c"
    );
    assert_eq!(expect_int(&eval(r#"strings.len("hello")"#)), 5);
    assert!(expect_bool(&eval(r#"strings.contains("tansy", "ans")"#)));

    let range = eval("collections.range(0, 5)");
    match range.0.as_ref() {
        ValueKind::Array(values) => {
            assert_eq!(values.len(), 5);
            assert_eq!(expect_int(&values[4]), 4);
        }
        _ => panic!("expected Array, found {}", range.type_name()),
    }

    let pushed = eval("collections.push([1, 2], 3)");
    match pushed.0.as_ref() {
        ValueKind::Array(values) => assert_eq!(values.len(), 3),
        _ => panic!("expected Array, found {}", pushed.type_name()),
    }
}

#[test]
fn interpreter_state_persists_across_sources() {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source("let total = 40")
        .expect("declaration should succeed");
    let value = interpreter
        .eval_source("total + 2")
        .expect("binding should persist");
    assert_eq!(expect_int(&value), 42);
}
