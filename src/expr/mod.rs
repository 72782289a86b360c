//! Dynamic-expression compiler
//!
//! Keyword string values compile into sandboxed programs. Three
//! families exist:
//!
//! - **Template** (`abstract`): literal fragments concatenated with
//!   pointer-dereferenced substitutions; a missing/null substitution
//!   contributes the empty string.
//! - **Predicate** (`visible`, `readonly`, `requiredIf`, `filter`,
//!   `case`): the result is boolean-coerced unless it is exactly null
//!   (tri-state preserved).
//! - **Value** (`dynamic`, `initialize`, `change`, `rank`, `from`):
//!   the result is returned verbatim.
//!
//! Non-string keyword values become constant programs; the predicate
//! family additionally coerces non-boolean/non-null constants to
//! boolean. Pointer back-references are backtick-delimited tokens
//! (`` `/abs/path` ``, `` `1/rel/path` ``, `` `0` ``).

mod ast;
mod errors;
mod eval;
mod parser;
mod sandbox;
mod token;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use errors::{ExprError, ExprResult};
pub use eval::{display_string, is_truthy};
pub use sandbox::Sandbox;

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// The expression family a keyword belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Boolean-coerced, null preserved
    Predicate,
    /// Result returned verbatim
    Value,
    /// Fragment concatenation producing a string
    Template,
}

/// One fragment of a compiled template.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Literal text
    Literal(String),
    /// Pointer substitution
    Pointer(String),
}

/// The compiled program behind an expression slot.
#[derive(Debug, Clone, PartialEq)]
enum Program {
    /// A constant result
    Const(Value),
    /// A template of fragments
    Template(Vec<Fragment>),
    /// A parsed expression
    Ast(Expr),
}

/// A compiled expression: the original source (when there was one) plus
/// an executable program.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: Option<String>,
    program: Program,
}

impl CompiledExpr {
    /// A constant-returning program.
    pub fn constant(value: Value) -> Self {
        CompiledExpr {
            source: None,
            program: Program::Const(value),
        }
    }

    /// The original source text, when the keyword value was a string.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Compile a keyword value for the given family.
    pub fn compile(family: Family, raw: &Value) -> ExprResult<Self> {
        match family {
            Family::Predicate => Self::compile_predicate(raw),
            Family::Value => Self::compile_value(raw),
            Family::Template => Self::compile_template(raw),
        }
    }

    /// Compile a value-family keyword.
    pub fn compile_value(raw: &Value) -> ExprResult<Self> {
        match raw {
            Value::String(source) => Ok(CompiledExpr {
                source: Some(source.clone()),
                program: Program::Ast(parser::parse(source)?),
            }),
            other => Ok(Self::constant(other.clone())),
        }
    }

    /// Compile a predicate-family keyword.
    ///
    /// Non-string, non-boolean, non-null constants are coerced to
    /// boolean at compile time.
    pub fn compile_predicate(raw: &Value) -> ExprResult<Self> {
        match raw {
            Value::String(source) => Ok(CompiledExpr {
                source: Some(source.clone()),
                program: Program::Ast(parser::parse(source)?),
            }),
            Value::Bool(_) | Value::Null => Ok(Self::constant(raw.clone())),
            other => Ok(Self::constant(Value::Bool(is_truthy(other)))),
        }
    }

    /// Compile a template-family keyword.
    pub fn compile_template(raw: &Value) -> ExprResult<Self> {
        match raw {
            Value::String(source) => Ok(CompiledExpr {
                source: Some(source.clone()),
                program: Program::Template(parse_template(source)),
            }),
            other => Ok(Self::constant(other.clone())),
        }
    }

    /// Evaluate to a raw value.
    pub fn eval_raw(&self, sandbox: &Sandbox<'_>) -> ExprResult<Value> {
        match &self.program {
            Program::Const(value) => Ok(value.clone()),
            Program::Ast(expr) => eval::eval(expr, sandbox),
            Program::Template(fragments) => {
                Ok(Value::String(render_template(fragments, sandbox)))
            }
        }
    }

    /// Evaluate as a value-family expression (verbatim result).
    pub fn eval_value(&self, sandbox: &Sandbox<'_>) -> ExprResult<Value> {
        self.eval_raw(sandbox)
    }

    /// Evaluate as a predicate.
    ///
    /// `None` is the preserved null of the tri-state; anything else is
    /// double-negated to a boolean.
    pub fn eval_predicate(&self, sandbox: &Sandbox<'_>) -> ExprResult<Option<bool>> {
        match self.eval_raw(sandbox)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            other => Ok(Some(is_truthy(&other))),
        }
    }

    /// Evaluate as a template, producing the rendered string.
    pub fn eval_template(&self, sandbox: &Sandbox<'_>) -> ExprResult<String> {
        match &self.program {
            Program::Template(fragments) => Ok(render_template(fragments, sandbox)),
            _ => Ok(display_string(&self.eval_raw(sandbox)?)),
        }
    }
}

fn render_template(fragments: &[Fragment], sandbox: &Sandbox<'_>) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Literal(text) => out.push_str(text),
            // Missing or null substitutions contribute nothing
            Fragment::Pointer(token) => out.push_str(&display_string(&sandbox.deref(token))),
        }
    }
    out
}

/// Split template source on backtick-delimited pointer tokens.
///
/// A backtick span that is not pointer-shaped stays literal text, and
/// an unterminated trailing backtick is kept verbatim.
fn parse_template(source: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut rest = source;
    while let Some(open) = rest.find('`') {
        match rest[open + 1..].find('`') {
            Some(len) => {
                let token = &rest[open + 1..open + 1 + len];
                if token.starts_with('/') || crate::pointer::is_relative(token) {
                    if open > 0 {
                        fragments.push(Fragment::Literal(rest[..open].to_string()));
                    }
                    fragments.push(Fragment::Pointer(token.to_string()));
                } else {
                    fragments.push(Fragment::Literal(rest[..open + 2 + len].to_string()));
                }
                rest = &rest[open + 2 + len..];
            }
            None => break,
        }
    }
    if !rest.is_empty() {
        fragments.push(Fragment::Literal(rest.to_string()));
    }
    fragments
}

static POINTER_TOKEN: OnceLock<Regex> = OnceLock::new();

/// Scan expression source text for backtick-delimited pointer
/// back-references. Used by the dependency tracker; tokens that are not
/// pointer-shaped are ignored.
pub fn pointer_refs(source: &str) -> Vec<String> {
    let re = POINTER_TOKEN.get_or_init(|| Regex::new(r"`([^`]+)`").expect("pointer token pattern"));
    re.captures_iter(source)
        .filter_map(|captures| {
            let token = captures[1].to_string();
            if token.starts_with('/') || crate::pointer::is_relative(&token) {
                Some(token)
            } else {
                None
            }
        })
        .collect()
}
