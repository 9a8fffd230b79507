use crate::ast::Stmt;
use crate::interpreter::error::RuntimeError;

use std::fmt;
use std::rc::Rc;

/// A user-defined function, possibly rewritten for tail-call optimization.
///
/// Created once when its `def` executes and immutable afterwards. For
/// trampolined functions `body` is the rewritten body and `context` holds
/// the auxiliary bindings from the decorator's keyword arguments, injected
/// into globals before every external invocation.
#[derive(Debug)]
pub struct FunctionObject {
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub body: Vec<Box<Stmt>>,
    pub trampolined: bool,
    pub context: Vec<(String, Value)>,
}

/// Parameter with its default already evaluated (defaults are evaluated at
/// definition time, as in Python).
#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub default: Option<Value>,
}

/// A function implemented in Rust and exposed to Serval code.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: Rc<dyn Fn(&[Value]) -> Result<Value, RuntimeError>>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native function {}>", self.name)
    }
}

/// Value type for the interpreter
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    None,
    Function(Rc<FunctionObject>),
    Native(NativeFunction),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::None => "NoneType",
            Value::Function(_) => "function",
            Value::Native(_) => "builtin_function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::None => false,
            Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// Name to report for a callable value, if it has one
    pub fn callable_name(&self) -> Option<&str> {
        match self {
            Value::Function(f) => Some(&f.name),
            Value::Native(n) => Some(&n.name),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => {
                let mut buffer = itoa::Buffer::new();
                write!(f, "{}", buffer.format(*i))
            }
            Value::Float(value) => {
                let mut buffer = ryu::Buffer::new();
                write!(f, "{}", buffer.format(*value))
            }
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::None => write!(f, "None"),
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Native(native) => write!(f, "<built-in function {}>", native.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Float(1.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }
}
