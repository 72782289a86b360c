//! Expression evaluator
//!
//! Evaluation is synchronous and side-effect-free. Type mismatches in
//! arithmetic raise an evaluation error; the owning node's accessor
//! catches it and substitutes the keyword's neutral fallback. Null is
//! absorbing in member/index access and comparisons, so expressions
//! over missing data stay quiet rather than failing.

use serde_json::Value;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::errors::{ExprError, ExprResult};
use super::sandbox::Sandbox;

/// Evaluate an expression against a sandbox.
pub fn eval(expr: &Expr, sandbox: &Sandbox<'_>) -> ExprResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => Ok(sandbox.lookup(name)),
        Expr::Pointer(token) => Ok(sandbox.deref(token)),
        Expr::Member(target, name) => {
            let target = eval(target, sandbox)?;
            Ok(match target {
                Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            })
        }
        Expr::Index(target, index) => {
            let target = eval(target, sandbox)?;
            let index = eval(index, sandbox)?;
            Ok(index_value(&target, &index))
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, sandbox)?);
            }
            call_builtin(name, &values)
        }
        Expr::Unary(op, operand) => {
            let operand = eval(operand, sandbox)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!is_truthy(&operand))),
                UnaryOp::Neg => negate(&operand),
            }
        }
        Expr::Binary(op, left, right) => eval_binary(*op, left, right, sandbox),
        Expr::Ternary(cond, then, otherwise) => {
            if is_truthy(&eval(cond, sandbox)?) {
                eval(then, sandbox)
            } else {
                eval(otherwise, sandbox)
            }
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    sandbox: &Sandbox<'_>,
) -> ExprResult<Value> {
    // Short-circuit logic first
    match op {
        BinaryOp::And => {
            let left = eval(left, sandbox)?;
            return if is_truthy(&left) {
                eval(right, sandbox)
            } else {
                Ok(left)
            };
        }
        BinaryOp::Or => {
            let left = eval(left, sandbox)?;
            return if is_truthy(&left) {
                Ok(left)
            } else {
                eval(right, sandbox)
            };
        }
        _ => {}
    }

    let left = eval(left, sandbox)?;
    let right = eval(right, sandbox)?;

    match op {
        BinaryOp::Add => add(&left, &right),
        BinaryOp::Sub => arithmetic(&left, &right, "-", |a, b| a - b, i64::checked_sub),
        BinaryOp::Mul => arithmetic(&left, &right, "*", |a, b| a * b, i64::checked_mul),
        BinaryOp::Div => divide(&left, &right),
        BinaryOp::Rem => remainder(&left, &right),
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, &left, &right),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

/// Truthiness: null and empty containers are false, everything else
/// follows its value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value the way templates and `string()` do.
///
/// Null renders as the empty string so a missing substitution never
/// leaves a placeholder word behind.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn number_from_f64(f: f64) -> ExprResult<Value> {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ExprError::eval("non-finite arithmetic result"))
}

fn negate(value: &Value) -> ExprResult<Value> {
    if let Some(i) = as_i64(value) {
        if let Some(n) = i.checked_neg() {
            return Ok(Value::from(n));
        }
    }
    match as_f64(value) {
        Some(f) => number_from_f64(-f),
        None => Err(ExprError::eval("cannot negate a non-numeric value")),
    }
}

/// `+` concatenates when either operand is a string, otherwise adds.
fn add(left: &Value, right: &Value) -> ExprResult<Value> {
    if left.is_string() || right.is_string() {
        return Ok(Value::String(format!(
            "{}{}",
            display_string(left),
            display_string(right)
        )));
    }
    arithmetic(left, right, "+", |a, b| a + b, i64::checked_add)
}

fn arithmetic(
    left: &Value,
    right: &Value,
    op: &str,
    float_op: fn(f64, f64) -> f64,
    int_op: fn(i64, i64) -> Option<i64>,
) -> ExprResult<Value> {
    if let (Some(a), Some(b)) = (as_i64(left), as_i64(right)) {
        if let Some(n) = int_op(a, b) {
            return Ok(Value::from(n));
        }
    }
    match (as_f64(left), as_f64(right)) {
        (Some(a), Some(b)) => number_from_f64(float_op(a, b)),
        _ => Err(ExprError::eval(format!(
            "cannot apply '{}' to non-numeric values",
            op
        ))),
    }
}

fn divide(left: &Value, right: &Value) -> ExprResult<Value> {
    let (a, b) = match (as_f64(left), as_f64(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(ExprError::eval("cannot divide non-numeric values")),
    };
    if b == 0.0 {
        return Err(ExprError::eval("division by zero"));
    }
    if let (Some(ia), Some(ib)) = (as_i64(left), as_i64(right)) {
        if ia % ib == 0 {
            return Ok(Value::from(ia / ib));
        }
    }
    number_from_f64(a / b)
}

fn remainder(left: &Value, right: &Value) -> ExprResult<Value> {
    if let (Some(a), Some(b)) = (as_i64(left), as_i64(right)) {
        if b == 0 {
            return Err(ExprError::eval("division by zero"));
        }
        return Ok(Value::from(a % b));
    }
    match (as_f64(left), as_f64(right)) {
        (Some(_), Some(b)) if b == 0.0 => Err(ExprError::eval("division by zero")),
        (Some(a), Some(b)) => number_from_f64(a % b),
        _ => Err(ExprError::eval("cannot apply '%' to non-numeric values")),
    }
}

/// Deep equality with numeric cross-type comparison (1 == 1.0).
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// Ordered comparison: numeric when both sides coerce to numbers,
/// lexicographic for string pairs, false when either side is null.
fn compare(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Bool(false));
    }
    let ordering = if let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) {
        a.partial_cmp(&b)
    } else if let (Value::String(a), Value::String(b)) = (left, right) {
        Some(a.cmp(b))
    } else {
        return Err(ExprError::eval("cannot compare values of these types"));
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn index_value(target: &Value, index: &Value) -> Value {
    match target {
        Value::Array(items) => match index.as_u64() {
            Some(i) => items.get(i as usize).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        },
        Value::Object(map) => match index.as_str() {
            Some(key) => map.get(key).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

/// The allow-listed function set. Unknown names return `null`, keeping
/// the sandbox inert for anything outside the list.
fn call_builtin(name: &str, args: &[Value]) -> ExprResult<Value> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
    match name {
        "length" => Ok(match arg(0) {
            Value::String(s) => Value::from(s.chars().count() as u64),
            Value::Array(items) => Value::from(items.len() as u64),
            Value::Object(map) => Value::from(map.len() as u64),
            _ => Value::Null,
        }),
        "contains" => Ok(Value::Bool(match (&arg(0), &arg(1)) {
            (Value::String(hay), needle) => hay.contains(&display_string(needle)),
            (Value::Array(items), needle) => items.iter().any(|v| values_equal(v, needle)),
            _ => false,
        })),
        "lower" => Ok(match arg(0) {
            Value::String(s) => Value::String(s.to_lowercase()),
            _ => Value::Null,
        }),
        "upper" => Ok(match arg(0) {
            Value::String(s) => Value::String(s.to_uppercase()),
            _ => Value::Null,
        }),
        "trim" => Ok(match arg(0) {
            Value::String(s) => Value::String(s.trim().to_string()),
            _ => Value::Null,
        }),
        "number" => Ok(match &arg(0) {
            v @ Value::Number(_) => v.clone(),
            Value::Bool(b) => Value::from(if *b { 1 } else { 0 }),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Value::from(i)
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    serde_json::Number::from_f64(f)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
            _ => Value::Null,
        }),
        "string" => Ok(Value::String(display_string(&arg(0)))),
        "round" | "floor" | "ceil" => Ok(match as_f64(&arg(0)) {
            Some(f) => {
                let result = match name {
                    "round" => f.round(),
                    "floor" => f.floor(),
                    _ => f.ceil(),
                };
                Value::from(result as i64)
            }
            None => Value::Null,
        }),
        "abs" => Ok(match (as_i64(&arg(0)), as_f64(&arg(0))) {
            (Some(i), _) if i.checked_abs().is_some() => Value::from(i.abs()),
            (_, Some(f)) => serde_json::Number::from_f64(f.abs())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        "min" | "max" => {
            let mut best: Option<Value> = None;
            for value in args {
                let Some(candidate) = as_f64(value) else {
                    continue;
                };
                let replace = match best.as_ref().and_then(as_f64) {
                    Some(current) => {
                        if name == "min" {
                            candidate < current
                        } else {
                            candidate > current
                        }
                    }
                    None => true,
                };
                if replace {
                    best = Some(value.clone());
                }
            }
            Ok(best.unwrap_or(Value::Null))
        }
        _ => Ok(Value::Null),
    }
}
