//! AST types for figure scripts

use std::rc::Rc;

/// A parsed script
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A statement plus the 1-based source line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Let { name: String, value: Expr },
    Def(Rc<FunctionDef>),
    For { var: String, iter: Expr, body: Vec<Statement> },
    Return(Option<Expr>),
    Expr(Expr),
}

/// A user-defined function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    /// Source name of the program the function was defined in
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Expr>),
    Variable(String),
    BinaryOp(Box<Expr>, BinaryOp, Box<Expr>),
    Neg(Box<Expr>),
    Call { callee: Box<Expr>, args: Vec<Arg> },
    Index { target: Box<Expr>, index: Box<Expr> },
    Attr { target: Box<Expr>, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// A call argument, positional or `name = value`
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
}
