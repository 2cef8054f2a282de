//! Syntax tree of a callable body.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

// -----------------------------------------------------------------------------
// Program

/// A parsed callable: formal parameters plus body statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    params: Vec<String>,
    body: Vec<Stmt>,
}

impl Program {
    #[inline]
    pub(crate) fn new(params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self { params, body }
    }

    /// Formal parameter names, in declaration order.
    #[inline]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[inline]
    pub fn body(&self) -> &[Stmt] {
        &self.body
    }
}

// -----------------------------------------------------------------------------
// Statements

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let`, `const` and `var` all declare a block-scoped binding.
    Let { name: String, init: Option<Expr> },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While { cond: Expr, body: Box<Stmt> },
    Block(Vec<Stmt>),
    Empty,
}

// -----------------------------------------------------------------------------
// Expressions

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    This,
    Array(Vec<Expr>),
    Member {
        object: Box<Expr>,
        name: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    /// Identifiers, member accesses and index accesses can be assigned to.
    #[inline]
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. })
    }
}
