#[cfg(test)]
mod interpreter_tests {
    use serval::interpreter::{Interpreter, RuntimeError, Value};
    use serval::lexer::Lexer;
    use serval::parser;
    use test_case::test_case;

    fn interpret(source: &str) -> Interpreter {
        let mut interpreter = Interpreter::with_recursion_limit(200);
        let mut lexer = Lexer::new(source);
        let module = parser::parse(lexer.tokenize()).expect("parse failed");
        interpreter.interpret(&module).expect("runtime error");
        interpreter
    }

    fn interpret_err(source: &str) -> RuntimeError {
        let mut interpreter = Interpreter::with_recursion_limit(200);
        let mut lexer = Lexer::new(source);
        let module = parser::parse(lexer.tokenize()).expect("parse failed");
        interpreter.interpret(&module).unwrap_err()
    }

    fn global(interpreter: &Interpreter, name: &str) -> Value {
        interpreter
            .get_global(name)
            .unwrap_or_else(|| panic!("global '{}' not set", name))
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        let interpreter = interpret(
            "\
a = 2 + 3 * 4
b = (2 + 3) * 4
c = 2 ** 3 ** 2
d = 7 // 2
e = -7 // 2
f = -7 % 3
g = 7 / 2
",
        );
        assert_eq!(global(&interpreter, "a"), Value::Int(14));
        assert_eq!(global(&interpreter, "b"), Value::Int(20));
        assert_eq!(global(&interpreter, "c"), Value::Int(512));
        assert_eq!(global(&interpreter, "d"), Value::Int(3));
        assert_eq!(global(&interpreter, "e"), Value::Int(-4));
        assert_eq!(global(&interpreter, "f"), Value::Int(2));
        assert_eq!(global(&interpreter, "g"), Value::Float(3.5));
    }

    #[test_case(7, 2, 3, 1 ; "positive operands")]
    #[test_case(-7, 2, -4, 1 ; "negative dividend")]
    #[test_case(7, -2, -4, -1 ; "negative divisor")]
    #[test_case(-7, -2, 3, -1 ; "both negative")]
    fn test_floor_division_rounds_toward_negative_infinity(a: i64, b: i64, quot: i64, rem: i64) {
        let interpreter = interpret(&format!("q = {} // {}\nr = {} % {}\n", a, b, a, b));
        assert_eq!(global(&interpreter, "q"), Value::Int(quot));
        assert_eq!(global(&interpreter, "r"), Value::Int(rem));
    }

    #[test]
    fn test_while_loop_with_break_and_else() {
        let interpreter = interpret(
            "\
i = 0
found = False
while i < 10:
    if i == 4:
        found = True
        break
    i += 1

j = 0
finished = False
while j < 3:
    j += 1
else:
    finished = True
",
        );
        assert_eq!(global(&interpreter, "i"), Value::Int(4));
        assert_eq!(global(&interpreter, "found"), Value::Bool(true));
        assert_eq!(global(&interpreter, "finished"), Value::Bool(true));
    }

    #[test]
    fn test_for_loop_over_range() {
        let interpreter = interpret(
            "\
total = 0
for i in range(1, 6):
    total += i

evens = 0
for i in range(0, 10, 2):
    evens += 1
",
        );
        assert_eq!(global(&interpreter, "total"), Value::Int(15));
        assert_eq!(global(&interpreter, "evens"), Value::Int(5));
    }

    #[test]
    fn test_list_operations() {
        let interpreter = interpret(
            "\
xs = [1, 2, 3]
xs[0] = 10
first = xs[0]
last = xs[-1]
n = len(xs)
total = sum(xs)
joined = [0] + xs
",
        );
        assert_eq!(global(&interpreter, "first"), Value::Int(10));
        assert_eq!(global(&interpreter, "last"), Value::Int(3));
        assert_eq!(global(&interpreter, "n"), Value::Int(3));
        assert_eq!(global(&interpreter, "total"), Value::Int(15));
        assert_eq!(
            global(&interpreter, "joined"),
            Value::List(vec![
                Value::Int(0),
                Value::Int(10),
                Value::Int(2),
                Value::Int(3)
            ])
        );
    }

    #[test]
    fn test_function_defaults_and_keyword_arguments() {
        let mut interpreter = interpret(
            "\
def power(base, exp=2):
    return base ** exp

a = power(3)
b = power(2, 5)
c = power(exp=3, base=2)
",
        );
        assert_eq!(global(&interpreter, "a"), Value::Int(9));
        assert_eq!(global(&interpreter, "b"), Value::Int(32));
        assert_eq!(global(&interpreter, "c"), Value::Int(8));

        let err = interpreter
            .call_function("power", &[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Arity {
                expected: 2,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_unexpected_keyword_argument() {
        let err = interpret_err(
            "\
def f(a):
    return a

f(b=1)
",
        );
        match err {
            RuntimeError::UnexpectedKeyword { func, keyword } => {
                assert_eq!(func, "f");
                assert_eq!(keyword, "b");
            }
            other => panic!("expected UnexpectedKeyword, got {}", other),
        }
    }

    #[test]
    fn test_conditional_expression_and_boolean_operators() {
        let interpreter = interpret(
            "\
a = 1 if True else 2
b = 0 or 'fallback'
c = 1 and 2
d = not []
",
        );
        assert_eq!(global(&interpreter, "a"), Value::Int(1));
        assert_eq!(global(&interpreter, "b"), Value::Str("fallback".to_string()));
        assert_eq!(global(&interpreter, "c"), Value::Int(2));
        assert_eq!(global(&interpreter, "d"), Value::Bool(true));
    }

    #[test]
    fn test_string_operations() {
        let interpreter = interpret(
            "\
s = 'hello' + ' ' + 'world'
n = len(s)
h = s[0]
d = s[-1]
",
        );
        assert_eq!(global(&interpreter, "s"), Value::Str("hello world".to_string()));
        assert_eq!(global(&interpreter, "n"), Value::Int(11));
        assert_eq!(global(&interpreter, "h"), Value::Str("h".to_string()));
        assert_eq!(global(&interpreter, "d"), Value::Str("d".to_string()));
    }

    #[test]
    fn test_local_scope_does_not_leak() {
        let interpreter = interpret(
            "\
x = 1

def shadow():
    x = 99
    return x

y = shadow()
",
        );
        assert_eq!(global(&interpreter, "x"), Value::Int(1));
        assert_eq!(global(&interpreter, "y"), Value::Int(99));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            interpret_err("x = 1 / 0"),
            RuntimeError::DivisionByZero
        ));
        assert!(matches!(
            interpret_err("x = 1 % 0"),
            RuntimeError::DivisionByZero
        ));
    }

    #[test]
    fn test_negative_exponent_yields_float() {
        let interpreter = interpret("a = 2 ** -2\nb = 2 ** -9223372036854775807\n");
        assert_eq!(global(&interpreter, "a"), Value::Float(0.25));
        // An exponent far below i32 range underflows to zero, not to an
        // arbitrary truncated power
        assert_eq!(global(&interpreter, "b"), Value::Float(0.0));
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let err = interpret_err("x = 9223372036854775807 + 1");
        assert!(matches!(err, RuntimeError::IntegerOverflow));
    }

    #[test]
    fn test_undefined_name() {
        match interpret_err("x = missing + 1") {
            RuntimeError::NameError(name) => assert_eq!(name, "missing"),
            other => panic!("expected NameError, got {}", other),
        }
    }

    #[test]
    fn test_calling_a_non_callable() {
        assert!(matches!(
            interpret_err("x = 1\ny = x(2)"),
            RuntimeError::NotCallable(_)
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        assert!(matches!(
            interpret_err("xs = [1]\ny = xs[5]"),
            RuntimeError::IndexError
        ));
    }

    #[test]
    fn test_recursion_limit_applies_to_plain_functions() {
        let err = interpret_err(
            "\
def spin(n):
    return spin(n + 1)

spin(0)
",
        );
        assert!(matches!(err, RuntimeError::RecursionLimit { limit: 200 }));
    }

    #[test]
    fn test_native_function_injection() {
        let mut interpreter = Interpreter::new();
        interpreter.inject_native("triple", |args| match args {
            [Value::Int(i)] => Ok(Value::Int(i * 3)),
            _ => Err(RuntimeError::TypeError("triple() wants an int".to_string())),
        });

        let mut lexer = Lexer::new("x = triple(14)");
        let module = parser::parse(lexer.tokenize()).expect("parse failed");
        interpreter.interpret(&module).expect("runtime error");
        assert_eq!(interpreter.get_global("x"), Some(Value::Int(42)));
    }

    #[test]
    fn test_chained_assignment() {
        let interpreter = interpret("a = b = 7");
        assert_eq!(global(&interpreter, "a"), Value::Int(7));
        assert_eq!(global(&interpreter, "b"), Value::Int(7));
    }

    #[test]
    fn test_return_outside_function_is_an_error() {
        assert!(matches!(
            interpret_err("return 1"),
            RuntimeError::TypeError(_)
        ));
    }
}
