pub mod error;
pub mod value;

pub use error::RuntimeError;
pub use value::{FunctionObject, FunctionParam, NativeFunction, Value};

use crate::ast::{
    BoolOperator, CmpOperator, Expr, Module, NameConstant, Number, Operator, Parameter, Stmt,
    UnaryOperator,
};
use crate::tco::{self, Registry, TransformError};

use std::collections::HashMap;
use std::rc::Rc;
use tracing::{trace, warn};

/// Result of executing a statement.
///
/// The tail-call transfer is an ordinary returned value, not an unwind: the
/// evaluator hands it up to the nearest trampoline loop, which keeps user
/// errors and control transfers on separate paths.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
    Tail(TailSignal),
}

/// Payload of a rewritten tail call: the resolved callee plus its evaluated
/// arguments. Created when a `Stmt::TailCall` executes and consumed
/// immediately by the enclosing trampoline loop.
#[derive(Debug)]
pub struct TailSignal {
    pub target: Value,
    pub args: Vec<Value>,
    pub kwargs: Vec<(String, Value)>,
}

/// Outcome of running one function body to completion.
enum Outcome {
    Return(Value),
    Tail(TailSignal),
}

const DEFAULT_RECURSION_LIMIT: usize = 1000;

// Native stack headroom for one interpreted call; grown in
// `STACK_GROWTH`-sized segments when the red zone is reached.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Tree-walking interpreter for Serval.
///
/// Owns the global environment, a stack of function-local scopes, the
/// tail-call registry and the call-depth counter that implements the
/// recursion ceiling.
pub struct Interpreter {
    globals: HashMap<String, Value>,
    locals: Vec<HashMap<String, Value>>,
    registry: Registry,
    depth: usize,
    recursion_limit: usize,
    strict_tco: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut interpreter = Interpreter {
            globals: HashMap::new(),
            locals: Vec::new(),
            registry: Registry::new(),
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            strict_tco: false,
        };
        interpreter.install_builtins();
        interpreter
    }

    pub fn with_recursion_limit(limit: usize) -> Self {
        let mut interpreter = Self::new();
        interpreter.recursion_limit = limit;
        interpreter
    }

    /// Reject decorated functions whose tail-position returns contain calls
    /// that cannot be converted, instead of only warning.
    pub fn strict_tco(mut self, strict: bool) -> Self {
        self.strict_tco = strict;
        self
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Interpret a module
    pub fn interpret(&mut self, module: &Module) -> Result<(), RuntimeError> {
        for stmt in &module.body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => {
                    return Err(RuntimeError::TypeError(
                        "'return' outside function".to_string(),
                    ))
                }
                Flow::Break => {
                    return Err(RuntimeError::TypeError("'break' outside loop".to_string()))
                }
                Flow::Continue => {
                    return Err(RuntimeError::TypeError(
                        "'continue' outside loop".to_string(),
                    ))
                }
                Flow::Tail(_) => {
                    return Err(RuntimeError::Internal(
                        "tail-call transfer escaped its trampoline".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Look up a global and call it with the given positional arguments.
    /// This is the embedding entry point used by the CLI and tests.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let callee = self
            .globals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::NameError(name.to_string()))?;
        self.call_value(&callee, args.to_vec(), Vec::new())
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }

    /// Bind a native helper into the global environment, e.g. to make a Rust
    /// function visible to decorated Serval code.
    pub fn inject_native<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        self.globals.insert(
            name.to_string(),
            Value::Native(NativeFunction {
                name: name.to_string(),
                func: Rc::new(func),
            }),
        );
    }

    // ---- statements ----

    fn exec_block(&mut self, body: &[Box<Stmt>]) -> Result<Flow, RuntimeError> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::FunctionDef {
                name,
                params,
                body,
                decorator_list,
                ..
            } => {
                self.exec_function_def(name, params, body, decorator_list)?;
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::TailCall {
                target,
                args,
                keywords,
                ..
            } => {
                let callee = self
                    .lookup(target)
                    .ok_or_else(|| RuntimeError::NameError(target.clone()))?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }
                let mut kwarg_values = Vec::with_capacity(keywords.len());
                for (key, expr) in keywords {
                    kwarg_values.push((key.clone(), self.eval_expr(expr)?));
                }
                Ok(Flow::Tail(TailSignal {
                    target: callee,
                    args: arg_values,
                    kwargs: kwarg_values,
                }))
            }
            Stmt::Assign { targets, value, .. } => {
                let value = self.eval_expr(value)?;
                for target in targets {
                    self.assign_target(target, value.clone())?;
                }
                Ok(Flow::Normal)
            }
            Stmt::AugAssign {
                target, op, value, ..
            } => {
                let id = match target.as_ref() {
                    Expr::Name { id, .. } => id.clone(),
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "invalid augmented assignment target: {}",
                            other
                        )))
                    }
                };
                let left = self
                    .lookup(&id)
                    .ok_or_else(|| RuntimeError::NameError(id.clone()))?;
                let right = self.eval_expr(value)?;
                let result = self.binary_op(left, *op, right)?;
                self.set_name(&id, result);
                Ok(Flow::Normal)
            }
            Stmt::If {
                test, body, orelse, ..
            } => {
                if self.eval_expr(test)?.is_truthy() {
                    self.exec_block(body)
                } else {
                    self.exec_block(orelse)
                }
            }
            Stmt::While {
                test, body, orelse, ..
            } => {
                loop {
                    if !self.eval_expr(test)?.is_truthy() {
                        return self.exec_block(orelse);
                    }
                    match self.exec_block(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => return Ok(Flow::Normal),
                        other => return Ok(other),
                    }
                }
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                let id = match target.as_ref() {
                    Expr::Name { id, .. } => id.clone(),
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "invalid for loop target: {}",
                            other
                        )))
                    }
                };
                let iter_value = self.eval_expr(iter)?;
                let values = match iter_value {
                    Value::List(values) => values,
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "'{}' object is not iterable",
                            other.type_name()
                        )))
                    }
                };
                for value in values {
                    self.set_name(&id, value);
                    match self.exec_block(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => return Ok(Flow::Normal),
                        other => return Ok(other),
                    }
                }
                self.exec_block(orelse)
            }
            Stmt::Expr { value, .. } => {
                self.eval_expr(value)?;
                Ok(Flow::Normal)
            }
            Stmt::Pass { .. } => Ok(Flow::Normal),
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Continue { .. } => Ok(Flow::Continue),
        }
    }

    /// Execute a `def`: evaluate parameter defaults, apply the `@tco`
    /// decorator if present (transform + register + context capture) and
    /// bind the resulting function object.
    fn exec_function_def(
        &mut self,
        name: &str,
        params: &[Parameter],
        body: &[Box<Stmt>],
        decorator_list: &[Box<Expr>],
    ) -> Result<(), RuntimeError> {
        let mut function_params = Vec::with_capacity(params.len());
        for param in params {
            let default = match &param.default {
                Some(expr) => Some(self.eval_expr(expr)?),
                None => None,
            };
            function_params.push(FunctionParam {
                name: param.name.clone(),
                default,
            });
        }

        let tco_keywords = match decorator_list {
            [] => None,
            [decorator] => Some(tco_decorator_keywords(decorator).ok_or_else(|| {
                RuntimeError::UnsupportedDecorator(decorator_name(decorator))
            })?),
            [_, second, ..] => {
                return Err(RuntimeError::UnsupportedDecorator(decorator_name(second)))
            }
        };

        let function = match tco_keywords {
            None => FunctionObject {
                name: name.to_string(),
                params: function_params,
                body: body.to_vec(),
                trampolined: false,
                context: Vec::new(),
            },
            Some(keywords) => {
                let transformed = tco::transform(name, params, body);
                for warning in &transformed.warnings {
                    if self.strict_tco {
                        return Err(RuntimeError::Transform(
                            TransformError::UnconvertedTailCall {
                                line: warning.line,
                                column: warning.column,
                            },
                        ));
                    }
                    warn!(function = name, "{}", warning);
                }

                let mut context = Vec::with_capacity(keywords.len());
                for (key, expr) in keywords {
                    context.push((key.clone(), self.eval_expr(expr)?));
                }

                // Registered before the function can possibly be called, so
                // mutual recursion resolves no matter the definition order.
                self.registry.register(name);

                FunctionObject {
                    name: name.to_string(),
                    params: function_params,
                    body: transformed.body,
                    trampolined: true,
                    context,
                }
            }
        };

        let trampolined = function.trampolined;
        let value = Value::Function(Rc::new(function));
        if trampolined {
            // Mirror of the original's exec-into-globals: a decorated
            // function is reachable by name from any scope, which is what
            // makes self-reference work for nested declarations.
            self.globals.insert(name.to_string(), value.clone());
        }
        self.set_name(name, value);
        Ok(())
    }

    // ---- calls and the trampoline ----

    pub fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Native(native) => {
                if !kwargs.is_empty() {
                    return Err(RuntimeError::TypeError(format!(
                        "{}() takes no keyword arguments",
                        native.name
                    )));
                }
                (native.func)(&args)
            }
            Value::Function(func) => {
                let func = func.clone();
                // Every interpreted call recurses through the evaluator's
                // native frames. Growing the stack here keeps the depth
                // counter, not the host stack, as the limit on recursion.
                stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
                    if func.trampolined && self.registry.is_registered(&func.name) {
                        self.run_trampoline(func, args, kwargs)
                    } else {
                        self.call_plain(func, args, kwargs)
                    }
                })
            }
            other => Err(RuntimeError::NotCallable(other.type_name().to_string())),
        }
    }

    /// Ordinary depth-counted call of an untransformed function.
    fn call_plain(
        &mut self,
        func: Rc<FunctionObject>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        self.enter_frame()?;
        let result = self.exec_function(func, args, kwargs);
        self.leave_frame();
        match result? {
            Outcome::Return(value) => Ok(value),
            Outcome::Tail(_) => Err(RuntimeError::Internal(
                "tail-call transfer escaped its trampoline".to_string(),
            )),
        }
    }

    /// The trampoline driver: external invocation of a registered function.
    ///
    /// One depth frame covers the whole loop. Each iteration runs the
    /// current target's body directly (the re-entrant form) while the target
    /// is registered; a transfer to an unregistered callable becomes an
    /// ordinary call, since its tail calls were never rewritten and it
    /// manages its own stack depth. Loop state is local to this invocation.
    fn run_trampoline(
        &mut self,
        func: Rc<FunctionObject>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        // Context bindings are re-injected on every external invocation
        // (idempotent overwrite), never on internal re-entries.
        for (name, value) in &func.context {
            self.globals.insert(name.clone(), value.clone());
        }

        trace!(function = %func.name, "entering trampoline");
        self.enter_frame()?;

        let mut target = Value::Function(func);
        let mut args = args;
        let mut kwargs = kwargs;

        let result = loop {
            let registered = matches!(
                &target,
                Value::Function(f) if self.registry.is_registered(&f.name)
            );

            if registered {
                let func = match &target {
                    Value::Function(f) => f.clone(),
                    _ => unreachable!(),
                };
                match self.exec_function(func, std::mem::take(&mut args), std::mem::take(&mut kwargs))
                {
                    Ok(Outcome::Return(value)) => break Ok(value),
                    Ok(Outcome::Tail(signal)) => {
                        trace!(
                            next = signal.target.callable_name().unwrap_or("?"),
                            "tail transfer"
                        );
                        target = signal.target;
                        args = signal.args;
                        kwargs = signal.kwargs;
                    }
                    Err(e) => break Err(e),
                }
            } else {
                let callee = target.clone();
                break self.call_value(&callee, std::mem::take(&mut args), std::mem::take(&mut kwargs));
            }
        };

        self.leave_frame();
        result
    }

    /// Run one function body: bind parameters into a fresh local scope and
    /// execute it. Does not charge a depth frame; callers decide whether
    /// this is a plain call or a trampoline iteration.
    fn exec_function(
        &mut self,
        func: Rc<FunctionObject>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Outcome, RuntimeError> {
        let scope = self.bind_parameters(&func, args, kwargs)?;
        self.locals.push(scope);
        let flow = self.exec_block(&func.body);
        self.locals.pop();

        match flow? {
            Flow::Return(value) => Ok(Outcome::Return(value)),
            Flow::Tail(signal) => Ok(Outcome::Tail(signal)),
            Flow::Normal => Ok(Outcome::Return(Value::None)),
            Flow::Break => Err(RuntimeError::TypeError("'break' outside loop".to_string())),
            Flow::Continue => Err(RuntimeError::TypeError(
                "'continue' outside loop".to_string(),
            )),
        }
    }

    fn bind_parameters(
        &self,
        func: &FunctionObject,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<HashMap<String, Value>, RuntimeError> {
        if args.len() > func.params.len() {
            return Err(RuntimeError::Arity {
                func: func.name.clone(),
                expected: func.params.len(),
                got: args.len(),
            });
        }

        let mut scope = HashMap::with_capacity(func.params.len());
        for (i, param) in func.params.iter().enumerate() {
            if let Some(value) = args.get(i) {
                scope.insert(param.name.clone(), value.clone());
            }
        }

        for (key, value) in kwargs {
            if !func.params.iter().any(|p| p.name == key) {
                return Err(RuntimeError::UnexpectedKeyword {
                    func: func.name.clone(),
                    keyword: key,
                });
            }
            if scope.contains_key(&key) {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got multiple values for argument '{}'",
                    func.name, key
                )));
            }
            scope.insert(key, value);
        }

        for param in &func.params {
            if !scope.contains_key(&param.name) {
                match &param.default {
                    Some(default) => {
                        scope.insert(param.name.clone(), default.clone());
                    }
                    None => {
                        return Err(RuntimeError::TypeError(format!(
                            "{}() missing required argument: '{}'",
                            func.name, param.name
                        )))
                    }
                }
            }
        }

        Ok(scope)
    }

    fn enter_frame(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.recursion_limit {
            return Err(RuntimeError::RecursionLimit {
                limit: self.recursion_limit,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_frame(&mut self) {
        self.depth -= 1;
    }

    // ---- expressions ----

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Name { id, .. } => self
                .lookup(id)
                .ok_or_else(|| RuntimeError::NameError(id.clone())),
            Expr::Num { value, .. } => Ok(match value {
                Number::Integer(i) => Value::Int(*i),
                Number::Float(f) => Value::Float(*f),
            }),
            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
            Expr::NameConstant { value, .. } => Ok(match value {
                NameConstant::True => Value::Bool(true),
                NameConstant::False => Value::Bool(false),
                NameConstant::None => Value::None,
            }),
            Expr::List { elts, .. } => {
                let mut values = Vec::with_capacity(elts.len());
                for elt in elts {
                    values.push(self.eval_expr(elt)?);
                }
                Ok(Value::List(values))
            }
            Expr::BoolOp { op, values, .. } => {
                let mut result = Value::None;
                for value in values {
                    result = self.eval_expr(value)?;
                    match op {
                        BoolOperator::And if !result.is_truthy() => return Ok(result),
                        BoolOperator::Or if result.is_truthy() => return Ok(result),
                        _ => {}
                    }
                }
                Ok(result)
            }
            Expr::BinOp {
                left, op, right, ..
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                self.binary_op(left, *op, right)
            }
            Expr::UnaryOp { op, operand, .. } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOperator::UAdd => match value {
                        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value),
                        other => Err(RuntimeError::TypeError(format!(
                            "bad operand type for unary +: '{}'",
                            other.type_name()
                        ))),
                    },
                    UnaryOperator::USub => match value {
                        Value::Int(i) => {
                            i.checked_neg().map(Value::Int).ok_or(RuntimeError::IntegerOverflow)
                        }
                        Value::Float(f) => Ok(Value::Float(-f)),
                        Value::Bool(b) => Ok(Value::Int(-(b as i64))),
                        other => Err(RuntimeError::TypeError(format!(
                            "bad operand type for unary -: '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            Expr::Compare {
                left, op, right, ..
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                self.compare(left, op, right)
            }
            Expr::IfExp {
                test, body, orelse, ..
            } => {
                if self.eval_expr(test)?.is_truthy() {
                    self.eval_expr(body)
                } else {
                    self.eval_expr(orelse)
                }
            }
            Expr::Call {
                func,
                args,
                keywords,
                ..
            } => {
                let callee = self.eval_expr(func)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }
                let mut kwarg_values = Vec::with_capacity(keywords.len());
                for (key, expr) in keywords {
                    kwarg_values.push((key.clone(), self.eval_expr(expr)?));
                }
                self.call_value(&callee, arg_values, kwarg_values)
            }
            Expr::Subscript { value, slice, .. } => {
                let value = self.eval_expr(value)?;
                let index = self.eval_expr(slice)?;
                match (value, index) {
                    (Value::List(list), Value::Int(idx)) => {
                        let idx = normalize_index(idx, list.len())?;
                        Ok(list[idx].clone())
                    }
                    (Value::Str(s), Value::Int(idx)) => {
                        let chars: Vec<char> = s.chars().collect();
                        let idx = normalize_index(idx, chars.len())?;
                        Ok(Value::Str(chars[idx].to_string()))
                    }
                    (value, index) => Err(RuntimeError::TypeError(format!(
                        "'{}' indices must be integers, not '{}'",
                        value.type_name(),
                        index.type_name()
                    ))),
                }
            }
        }
    }

    fn binary_op(&self, left: Value, op: Operator, right: Value) -> Result<Value, RuntimeError> {
        use Operator::*;
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => match op {
                Add => l.checked_add(r).map(Value::Int).ok_or(RuntimeError::IntegerOverflow),
                Sub => l.checked_sub(r).map(Value::Int).ok_or(RuntimeError::IntegerOverflow),
                Mult => l.checked_mul(r).map(Value::Int).ok_or(RuntimeError::IntegerOverflow),
                Div => {
                    if r == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(Value::Float(l as f64 / r as f64))
                    }
                }
                FloorDiv => {
                    if r == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(Value::Int(floor_div(l, r)))
                    }
                }
                Mod => {
                    if r == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(Value::Int(floor_mod(l, r)))
                    }
                }
                Pow => {
                    if r >= 0 {
                        let exp = u32::try_from(r).map_err(|_| RuntimeError::IntegerOverflow)?;
                        l.checked_pow(exp).map(Value::Int).ok_or(RuntimeError::IntegerOverflow)
                    } else {
                        Ok(Value::Float((l as f64).powf(r as f64)))
                    }
                }
            },
            (Value::Str(l), Value::Str(r)) if op == Add => Ok(Value::Str(l + &r)),
            (Value::List(mut l), Value::List(r)) if op == Add => {
                l.extend(r);
                Ok(Value::List(l))
            }
            (left, right) => {
                let (l, r) = match (as_float(&left), as_float(&right)) {
                    (Some(l), Some(r)) => (l, r),
                    _ => {
                        return Err(RuntimeError::TypeError(format!(
                            "unsupported operand types for {}: '{}' and '{}'",
                            op_symbol(op),
                            left.type_name(),
                            right.type_name()
                        )))
                    }
                };
                match op {
                    Add => Ok(Value::Float(l + r)),
                    Sub => Ok(Value::Float(l - r)),
                    Mult => Ok(Value::Float(l * r)),
                    Div => {
                        if r == 0.0 {
                            Err(RuntimeError::DivisionByZero)
                        } else {
                            Ok(Value::Float(l / r))
                        }
                    }
                    FloorDiv => {
                        if r == 0.0 {
                            Err(RuntimeError::DivisionByZero)
                        } else {
                            Ok(Value::Float((l / r).floor()))
                        }
                    }
                    Mod => {
                        if r == 0.0 {
                            Err(RuntimeError::DivisionByZero)
                        } else {
                            Ok(Value::Float(l - r * (l / r).floor()))
                        }
                    }
                    Pow => Ok(Value::Float(l.powf(r))),
                }
            }
        }
    }

    fn compare(&self, left: Value, op: &CmpOperator, right: Value) -> Result<Value, RuntimeError> {
        let result = match op {
            CmpOperator::Eq => left == right,
            CmpOperator::NotEq => left != right,
            ordering => {
                let cmp = match (&left, &right) {
                    (Value::Str(l), Value::Str(r)) => l.partial_cmp(r),
                    (l, r) => match (as_float(l), as_float(r)) {
                        (Some(l), Some(r)) => l.partial_cmp(&r),
                        _ => None,
                    },
                };
                let cmp = cmp.ok_or_else(|| {
                    RuntimeError::TypeError(format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        cmp_symbol(ordering),
                        left.type_name(),
                        right.type_name()
                    ))
                })?;
                match ordering {
                    CmpOperator::Lt => cmp == std::cmp::Ordering::Less,
                    CmpOperator::LtE => cmp != std::cmp::Ordering::Greater,
                    CmpOperator::Gt => cmp == std::cmp::Ordering::Greater,
                    CmpOperator::GtE => cmp != std::cmp::Ordering::Less,
                    _ => unreachable!(),
                }
            }
        };
        Ok(Value::Bool(result))
    }

    // ---- environment ----

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(scope) = self.locals.last() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    fn set_name(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name.to_string(), value);
        } else {
            self.globals.insert(name.to_string(), value);
        }
    }

    fn assign_target(&mut self, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        match target {
            Expr::Name { id, .. } => {
                self.set_name(id, value);
                Ok(())
            }
            Expr::Subscript {
                value: object,
                slice,
                ..
            } => {
                let name = match object.as_ref() {
                    Expr::Name { id, .. } => id.clone(),
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "unsupported assignment target: {}",
                            other
                        )))
                    }
                };
                let index = match self.eval_expr(slice)? {
                    Value::Int(i) => i,
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "list indices must be integers, not '{}'",
                            other.type_name()
                        )))
                    }
                };
                let mut list = match self.lookup(&name) {
                    Some(Value::List(list)) => list,
                    Some(other) => {
                        return Err(RuntimeError::TypeError(format!(
                            "'{}' object does not support item assignment",
                            other.type_name()
                        )))
                    }
                    None => return Err(RuntimeError::NameError(name)),
                };
                let idx = normalize_index(index, list.len())?;
                list[idx] = value;
                self.set_name(&name, Value::List(list));
                Ok(())
            }
            other => Err(RuntimeError::TypeError(format!(
                "unsupported assignment target: {}",
                other
            ))),
        }
    }

    // ---- builtins ----

    fn install_builtins(&mut self) {
        self.inject_native("print", |args| {
            let mut out = String::new();
            for (i, value) in args.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(&value.to_string());
            }
            println!("{}", out);
            Ok(Value::None)
        });

        self.inject_native("range", |args| {
            let bounds: Vec<i64> = args
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Ok(*i),
                    other => Err(RuntimeError::TypeError(format!(
                        "range() arguments must be integers, not '{}'",
                        other.type_name()
                    ))),
                })
                .collect::<Result<_, _>>()?;

            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => {
                    return Err(RuntimeError::TypeError(format!(
                        "range() takes 1-3 arguments, got {}",
                        bounds.len()
                    )))
                }
            };
            if step == 0 {
                return Err(RuntimeError::TypeError(
                    "range() step must not be zero".to_string(),
                ));
            }

            let mut values = Vec::new();
            let mut i = start;
            while if step > 0 { i < stop } else { i > stop } {
                values.push(Value::Int(i));
                i += step;
            }
            Ok(Value::List(values))
        });

        self.inject_native("len", |args| match args {
            [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
            [Value::List(l)] => Ok(Value::Int(l.len() as i64)),
            [other] => Err(RuntimeError::TypeError(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
            _ => Err(RuntimeError::TypeError(format!(
                "len() takes exactly one argument ({} given)",
                args.len()
            ))),
        });

        self.inject_native("sum", |args| {
            let list = match args {
                [Value::List(l)] => l,
                [other] => {
                    return Err(RuntimeError::TypeError(format!(
                        "'{}' object is not iterable",
                        other.type_name()
                    )))
                }
                _ => {
                    return Err(RuntimeError::TypeError(format!(
                        "sum() takes exactly one argument ({} given)",
                        args.len()
                    )))
                }
            };

            let mut int_total: i64 = 0;
            let mut float_total = 0.0;
            let mut is_float = false;
            for value in list {
                match value {
                    Value::Int(i) => {
                        int_total = int_total
                            .checked_add(*i)
                            .ok_or(RuntimeError::IntegerOverflow)?;
                    }
                    Value::Float(f) => {
                        is_float = true;
                        float_total += f;
                    }
                    Value::Bool(b) => {
                        int_total = int_total
                            .checked_add(*b as i64)
                            .ok_or(RuntimeError::IntegerOverflow)?;
                    }
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "unsupported operand type for sum: '{}'",
                            other.type_name()
                        )))
                    }
                }
            }
            if is_float {
                Ok(Value::Float(float_total + int_total as f64))
            } else {
                Ok(Value::Int(int_total))
            }
        });
    }
}

fn normalize_index(index: i64, len: usize) -> Result<usize, RuntimeError> {
    let idx = if index < 0 { index + len as i64 } else { index };
    if idx < 0 || idx as usize >= len {
        return Err(RuntimeError::IndexError);
    }
    Ok(idx as usize)
}

fn floor_div(l: i64, r: i64) -> i64 {
    let q = l / r;
    if l % r != 0 && (l < 0) != (r < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(l: i64, r: i64) -> i64 {
    let m = l % r;
    if m != 0 && (m < 0) != (r < 0) {
        m + r
    } else {
        m
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(*b as i64 as f64),
        _ => None,
    }
}

fn op_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mult => "*",
        Operator::Div => "/",
        Operator::FloorDiv => "//",
        Operator::Mod => "%",
        Operator::Pow => "**",
    }
}

fn cmp_symbol(op: &CmpOperator) -> &'static str {
    match op {
        CmpOperator::Eq => "==",
        CmpOperator::NotEq => "!=",
        CmpOperator::Lt => "<",
        CmpOperator::LtE => "<=",
        CmpOperator::Gt => ">",
        CmpOperator::GtE => ">=",
    }
}

/// If `decorator` is `tco` or `tco(...)`, return its keyword arguments.
fn tco_decorator_keywords(decorator: &Expr) -> Option<&[(String, Box<Expr>)]> {
    const EMPTY: &[(String, Box<Expr>)] = &[];
    match decorator {
        Expr::Name { id, .. } if id == "tco" => Some(EMPTY),
        Expr::Call { func, keywords, .. } => match func.as_ref() {
            Expr::Name { id, .. } if id == "tco" => Some(keywords),
            _ => None,
        },
        _ => None,
    }
}

fn decorator_name(decorator: &Expr) -> String {
    match decorator {
        Expr::Name { id, .. } => id.clone(),
        Expr::Call { func, .. } => decorator_name(func),
        other => other.to_string(),
    }
}
