use crate::ast::{Expr, Parameter, Stmt};

use std::fmt;
use thiserror::Error;

/// Rejection of a function at decoration time (strict mode only).
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error(
        "line {line}, column {column}: return value contains a call that is not a bare tail call"
    )]
    UnconvertedTailCall { line: usize, column: usize },
}

/// A tail-position return that could not be converted because its value is
/// not a single direct call (`return f(x) + 1`, `return [f(x)]`, ...). The
/// statement keeps ordinary stack-growing semantics.
#[derive(Debug, Clone)]
pub struct TransformWarning {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: return value contains a call, but only `return name(args)` \
             is converted to a tail call",
            self.line, self.column
        )
    }
}

/// Result of transforming a function definition for tail-call optimization.
#[derive(Debug, Clone)]
pub struct TrampolinedFunction {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Box<Stmt>>,
    pub warnings: Vec<TransformWarning>,
}

/// Rewrite a function body so that every `return name(args)` statement
/// becomes a `Stmt::TailCall` control-transfer node.
///
/// Only a return whose entire value is a single direct call of a plain name
/// is converted. Other returns are copied through unchanged; if such a
/// return still contains a call somewhere in its value, a warning is
/// recorded since the author may have expected it to be optimized. Nested
/// function definitions are not descended into; they are decorated (or not)
/// on their own.
pub fn transform(name: &str, params: &[Parameter], body: &[Box<Stmt>]) -> TrampolinedFunction {
    let mut warnings = Vec::new();
    let body = rewrite_block(body, &mut warnings);

    TrampolinedFunction {
        name: name.to_string(),
        params: params.to_vec(),
        body,
        warnings,
    }
}

fn rewrite_block(stmts: &[Box<Stmt>], warnings: &mut Vec<TransformWarning>) -> Vec<Box<Stmt>> {
    stmts
        .iter()
        .map(|stmt| Box::new(rewrite_stmt(stmt, warnings)))
        .collect()
}

fn rewrite_stmt(stmt: &Stmt, warnings: &mut Vec<TransformWarning>) -> Stmt {
    match stmt {
        Stmt::Return {
            value: Some(value),
            line,
            column,
        } => {
            if let Expr::Call {
                func, args, keywords, ..
            } = value.as_ref()
            {
                if let Expr::Name { id, .. } = func.as_ref() {
                    return Stmt::TailCall {
                        target: id.clone(),
                        args: args.clone(),
                        keywords: keywords.clone(),
                        line: *line,
                        column: *column,
                    };
                }
            }
            if contains_call(value) {
                warnings.push(TransformWarning {
                    line: *line,
                    column: *column,
                });
            }
            stmt.clone()
        }
        Stmt::If {
            test,
            body,
            orelse,
            line,
            column,
        } => Stmt::If {
            test: test.clone(),
            body: rewrite_block(body, warnings),
            orelse: rewrite_block(orelse, warnings),
            line: *line,
            column: *column,
        },
        Stmt::While {
            test,
            body,
            orelse,
            line,
            column,
        } => Stmt::While {
            test: test.clone(),
            body: rewrite_block(body, warnings),
            orelse: rewrite_block(orelse, warnings),
            line: *line,
            column: *column,
        },
        Stmt::For {
            target,
            iter,
            body,
            orelse,
            line,
            column,
        } => Stmt::For {
            target: target.clone(),
            iter: iter.clone(),
            body: rewrite_block(body, warnings),
            orelse: rewrite_block(orelse, warnings),
            line: *line,
            column: *column,
        },
        // A nested def keeps its own returns
        other => other.clone(),
    }
}

fn contains_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call { .. } => true,
        Expr::BoolOp { values, .. } => values.iter().any(|v| contains_call(v)),
        Expr::BinOp { left, right, .. } => contains_call(left) || contains_call(right),
        Expr::UnaryOp { operand, .. } => contains_call(operand),
        Expr::IfExp {
            test, body, orelse, ..
        } => contains_call(test) || contains_call(body) || contains_call(orelse),
        Expr::Compare { left, right, .. } => contains_call(left) || contains_call(right),
        Expr::List { elts, .. } => elts.iter().any(|e| contains_call(e)),
        Expr::Subscript { value, slice, .. } => contains_call(value) || contains_call(slice),
        Expr::Num { .. }
        | Expr::Str { .. }
        | Expr::NameConstant { .. }
        | Expr::Name { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser;

    fn function_parts(source: &str) -> (String, Vec<Parameter>, Vec<Box<Stmt>>) {
        let mut lexer = Lexer::new(source);
        let module = parser::parse(lexer.tokenize()).expect("parse failed");
        match module.body.into_iter().next().unwrap().as_ref() {
            Stmt::FunctionDef {
                name, params, body, ..
            } => (name.clone(), params.clone(), body.clone()),
            other => panic!("expected FunctionDef, got {}", other),
        }
    }

    #[test]
    fn test_bare_return_call_becomes_tail_call() {
        let (name, params, body) = function_parts(
            "def factorial(n, acc):\n    if n <= 1:\n        return acc\n    return factorial(n - 1, n * acc)\n",
        );
        let transformed = transform(&name, &params, &body);
        assert!(transformed.warnings.is_empty());

        match transformed.body[1].as_ref() {
            Stmt::TailCall { target, args, .. } => {
                assert_eq!(target, "factorial");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected TailCall, got {}", other),
        }
        // The base-case return is untouched
        match transformed.body[0].as_ref() {
            Stmt::If { body, .. } => assert!(matches!(body[0].as_ref(), Stmt::Return { .. })),
            other => panic!("expected If, got {}", other),
        }
    }

    #[test]
    fn test_compound_return_is_left_alone_with_warning() {
        let (name, params, body) =
            function_parts("def f(n):\n    if n <= 0:\n        return 0\n    return f(n - 1) + 1\n");
        let transformed = transform(&name, &params, &body);
        assert_eq!(transformed.warnings.len(), 1);
        assert!(matches!(transformed.body[1].as_ref(), Stmt::Return { .. }));
    }

    #[test]
    fn test_conditional_return_warns() {
        let (name, params, body) =
            function_parts("def f(n):\n    return f(n - 1) if n > 0 else 0\n");
        let transformed = transform(&name, &params, &body);
        assert_eq!(transformed.warnings.len(), 1);
    }

    #[test]
    fn test_non_call_returns_do_not_warn() {
        let (name, params, body) = function_parts("def f(n):\n    return n + 1\n");
        let transformed = transform(&name, &params, &body);
        assert!(transformed.warnings.is_empty());
        assert!(matches!(transformed.body[0].as_ref(), Stmt::Return { .. }));
    }

    #[test]
    fn test_nested_def_is_not_rewritten() {
        let (name, params, body) = function_parts(
            "def outer(n):\n    def inner(k):\n        return inner(k - 1)\n    return outer(n - 1)\n",
        );
        let transformed = transform(&name, &params, &body);
        match transformed.body[0].as_ref() {
            Stmt::FunctionDef { body, .. } => {
                assert!(matches!(body[0].as_ref(), Stmt::Return { .. }));
            }
            other => panic!("expected FunctionDef, got {}", other),
        }
        assert!(matches!(transformed.body[1].as_ref(), Stmt::TailCall { .. }));
    }

    #[test]
    fn test_return_inside_loop_is_tail_position() {
        let (name, params, body) = function_parts(
            "def f(n):\n    while True:\n        return f(n - 1)\n",
        );
        let transformed = transform(&name, &params, &body);
        match transformed.body[0].as_ref() {
            Stmt::While { body, .. } => {
                assert!(matches!(body[0].as_ref(), Stmt::TailCall { .. }));
            }
            other => panic!("expected While, got {}", other),
        }
    }
}
