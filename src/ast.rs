use std::fmt;

#[derive(Debug, Clone)]
pub enum Stmt {
    FunctionDef {
        name: String,
        params: Vec<Parameter>,
        body: Vec<Box<Stmt>>,
        decorator_list: Vec<Box<Expr>>,
        line: usize,
        column: usize,
    },
    Return {
        value: Option<Box<Expr>>,
        line: usize,
        column: usize,
    },
    /// Control-transfer form of `return target(args)`. Never produced by the
    /// parser; the tail-call transformer rewrites qualifying returns into
    /// this node so the trampoline can consume them as data.
    TailCall {
        target: String,
        args: Vec<Box<Expr>>,
        keywords: Vec<(String, Box<Expr>)>,
        line: usize,
        column: usize,
    },
    Assign {
        targets: Vec<Box<Expr>>,
        value: Box<Expr>,
        line: usize,
        column: usize,
    },
    AugAssign {
        target: Box<Expr>,
        op: Operator,
        value: Box<Expr>,
        line: usize,
        column: usize,
    },
    For {
        target: Box<Expr>,
        iter: Box<Expr>,
        body: Vec<Box<Stmt>>,
        orelse: Vec<Box<Stmt>>,
        line: usize,
        column: usize,
    },
    While {
        test: Box<Expr>,
        body: Vec<Box<Stmt>>,
        orelse: Vec<Box<Stmt>>,
        line: usize,
        column: usize,
    },
    If {
        test: Box<Expr>,
        body: Vec<Box<Stmt>>,
        orelse: Vec<Box<Stmt>>,
        line: usize,
        column: usize,
    },
    Expr {
        value: Box<Expr>,
        line: usize,
        column: usize,
    },
    Pass {
        line: usize,
        column: usize,
    },
    Break {
        line: usize,
        column: usize,
    },
    Continue {
        line: usize,
        column: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::FunctionDef { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::TailCall { line, .. }
            | Stmt::Assign { line, .. }
            | Stmt::AugAssign { line, .. }
            | Stmt::For { line, .. }
            | Stmt::While { line, .. }
            | Stmt::If { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::Pass { line, .. }
            | Stmt::Break { line, .. }
            | Stmt::Continue { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    BoolOp {
        op: BoolOperator,
        values: Vec<Box<Expr>>,
        line: usize,
        column: usize,
    },
    BinOp {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
        line: usize,
        column: usize,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
        line: usize,
        column: usize,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        line: usize,
        column: usize,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOperator,
        right: Box<Expr>,
        line: usize,
        column: usize,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Box<Expr>>,
        keywords: Vec<(String, Box<Expr>)>,
        line: usize,
        column: usize,
    },
    Num {
        value: Number,
        line: usize,
        column: usize,
    },
    Str {
        value: String,
        line: usize,
        column: usize,
    },
    NameConstant {
        value: NameConstant,
        line: usize,
        column: usize,
    },
    Name {
        id: String,
        line: usize,
        column: usize,
    },
    List {
        elts: Vec<Box<Expr>>,
        line: usize,
        column: usize,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
        line: usize,
        column: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::BoolOp { line, .. }
            | Expr::BinOp { line, .. }
            | Expr::UnaryOp { line, .. }
            | Expr::IfExp { line, .. }
            | Expr::Compare { line, .. }
            | Expr::Call { line, .. }
            | Expr::Num { line, .. }
            | Expr::Str { line, .. }
            | Expr::NameConstant { line, .. }
            | Expr::Name { line, .. }
            | Expr::List { line, .. }
            | Expr::Subscript { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Expr::BoolOp { column, .. }
            | Expr::BinOp { column, .. }
            | Expr::UnaryOp { column, .. }
            | Expr::IfExp { column, .. }
            | Expr::Compare { column, .. }
            | Expr::Call { column, .. }
            | Expr::Num { column, .. }
            | Expr::Str { column, .. }
            | Expr::NameConstant { column, .. }
            | Expr::Name { column, .. }
            | Expr::List { column, .. }
            | Expr::Subscript { column, .. } => *column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoolOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOperator {
    Not,
    UAdd,
    USub,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmpOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameConstant {
    None,
    True,
    False,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub body: Vec<Box<Stmt>>,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Module:")?;
        for stmt in &self.body {
            writeln!(f, "  {}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::FunctionDef { name, .. } => write!(f, "FunctionDef: {}", name),
            Stmt::Return { .. } => write!(f, "Return"),
            Stmt::TailCall { target, .. } => write!(f, "TailCall: {}", target),
            Stmt::Assign { .. } => write!(f, "Assign"),
            Stmt::AugAssign { .. } => write!(f, "AugAssign"),
            Stmt::For { .. } => write!(f, "For"),
            Stmt::While { .. } => write!(f, "While"),
            Stmt::If { .. } => write!(f, "If"),
            Stmt::Expr { .. } => write!(f, "Expr"),
            Stmt::Pass { .. } => write!(f, "Pass"),
            Stmt::Break { .. } => write!(f, "Break"),
            Stmt::Continue { .. } => write!(f, "Continue"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::BoolOp { .. } => write!(f, "BoolOp"),
            Expr::BinOp { .. } => write!(f, "BinOp"),
            Expr::UnaryOp { .. } => write!(f, "UnaryOp"),
            Expr::IfExp { .. } => write!(f, "IfExp"),
            Expr::Compare { .. } => write!(f, "Compare"),
            Expr::Call { .. } => write!(f, "Call"),
            Expr::Num { value, .. } => write!(f, "Num({:?})", value),
            Expr::Str { value, .. } => write!(f, "Str({})", value),
            Expr::NameConstant { value, .. } => write!(f, "NameConstant({:?})", value),
            Expr::Name { id, .. } => write!(f, "Name({})", id),
            Expr::List { .. } => write!(f, "List"),
            Expr::Subscript { .. } => write!(f, "Subscript"),
        }
    }
}
