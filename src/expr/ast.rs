//! Expression abstract syntax
//!
//! Every operator is a direct enum variant; there is no string matching
//! at evaluation time.

use serde_json::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation (truthiness)
    Not,
    /// Numeric negation
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Identifier, resolved through the sandbox binding table
    Ident(String),
    /// Pointer back-reference, dereferenced at the sandbox position
    Pointer(String),
    /// Member access `a.b`
    Member(Box<Expr>, String),
    /// Index access `a[i]`
    Index(Box<Expr>, Box<Expr>),
    /// Call to an allow-listed function
    Call(String, Vec<Expr>),
    /// Unary operation
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Ternary conditional `c ? a : b`
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}
