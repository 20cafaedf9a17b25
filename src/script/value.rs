//! Runtime values and their arithmetic

use std::fmt;
use std::rc::Rc;

use super::Raised;
use super::ast::{BinaryOp, FunctionDef};
use crate::errors::ErrorKind;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Function(Rc<FunctionDef>),
    /// A native function; `module` is `Some("plt")` for plotting calls
    Builtin {
        module: Option<&'static str>,
        name: &'static str,
    },
    Module(&'static str),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (
                Value::Builtin { module: ma, name: na },
                Value::Builtin { module: mb, name: nb },
            ) => ma == mb && na == nb,
            (Value::Module(a), Value::Module(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Number(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Builtin { .. } => "builtin_function_or_method",
            Value::Module(_) => "module",
        }
    }

    pub fn numbers(values: impl IntoIterator<Item = f64>) -> Value {
        Value::List(values.into_iter().map(Value::Number).collect())
    }

    /// A scalar number; booleans count as 0 and 1
    pub(crate) fn as_f64(&self) -> Result<f64, Raised> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(Raised::type_error(format!(
                "must be a real number, not {}",
                other.type_name()
            ))),
        }
    }

    /// A whole number, for counts and indices
    pub(crate) fn as_int(&self) -> Result<i64, Raised> {
        let n = self.as_f64()?;
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(Raised::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                self.type_name()
            )));
        }
        Ok(n as i64)
    }

    /// A flat list of numbers; a scalar becomes a one-element list
    pub(crate) fn as_f64_list(&self) -> Result<Vec<f64>, Raised> {
        match self {
            Value::List(items) => items.iter().map(Value::as_f64).collect(),
            scalar => Ok(vec![scalar.as_f64()?]),
        }
    }

    pub(crate) fn as_str(&self) -> Result<&str, Raised> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Raised::type_error(format!(
                "expected str, got {}",
                other.type_name()
            ))),
        }
    }

    /// Zero, empty strings and lists, and `None` are false
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// `repr()`-style rendering, used for list elements
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

fn fmt_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Number(n) => f.write_str(&fmt_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Function(def) => write!(f, "<function {}>", def.name),
            Value::Builtin { name, .. } => write!(f, "<built-in function {name}>"),
            Value::Module(name) => write!(f, "<module '{name}'>"),
        }
    }
}

fn scalar_op(op: BinaryOp, a: f64, b: f64, elementwise: bool) -> Result<f64, Raised> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div => {
            if b == 0.0 && !elementwise {
                return Err(Raised::new(ErrorKind::ZeroDivisionError, "float division by zero"));
            }
            Ok(a / b)
        }
        BinaryOp::Rem => {
            if b == 0.0 && !elementwise {
                return Err(Raised::new(ErrorKind::ZeroDivisionError, "float modulo"));
            }
            // sign follows the divisor
            Ok(a - b * (a / b).floor())
        }
        BinaryOp::Pow => Ok(a.powf(b)),
    }
}

fn unsupported(op: BinaryOp, l: &Value, r: &Value) -> Raised {
    Raised::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}

/// Apply `op`. Lists combine elementwise with scalars and with lists of the
/// same length; elementwise division by zero yields inf or nan.
pub(crate) fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Raised> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Err(Raised::value(format!(
                    "operands could not be broadcast together with shapes ({},) ({},)",
                    a.len(),
                    b.len()
                )));
            }
            a.iter()
                .zip(b)
                .map(|(x, y)| elementwise(op, x, y))
                .collect::<Result<_, _>>()
                .map(Value::List)
        }
        (Value::List(a), scalar) => a
            .iter()
            .map(|x| elementwise(op, x, scalar))
            .collect::<Result<_, _>>()
            .map(Value::List),
        (scalar, Value::List(b)) => b
            .iter()
            .map(|y| elementwise(op, scalar, y))
            .collect::<Result<_, _>>()
            .map(Value::List),
        (Value::Number(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_)) => {
            scalar_op(op, l.as_f64()?, r.as_f64()?, false).map(Value::Number)
        }
        _ => Err(unsupported(op, l, r)),
    }
}

fn elementwise(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Raised> {
    match (l, r) {
        (Value::List(_), _) | (_, Value::List(_)) => binary(op, l, r),
        _ => {
            let (a, b) = (
                l.as_f64().map_err(|_| unsupported(op, l, r))?,
                r.as_f64().map_err(|_| unsupported(op, l, r))?,
            );
            scalar_op(op, a, b, true).map(Value::Number)
        }
    }
}

pub(crate) fn negate(v: &Value) -> Result<Value, Raised> {
    match v {
        Value::List(items) => items.iter().map(negate).collect::<Result<_, _>>().map(Value::List),
        Value::Number(_) | Value::Bool(_) => Ok(Value::Number(-v.as_f64()?)),
        other => Err(Raised::type_error(format!(
            "bad operand type for unary -: '{}'",
            other.type_name()
        ))),
    }
}

/// Apply a unary math function to a number or, elementwise, a list
pub(crate) fn map_numbers(v: &Value, f: fn(f64) -> f64) -> Result<Value, Raised> {
    match v {
        Value::List(items) => items
            .iter()
            .map(|item| map_numbers(item, f))
            .collect::<Result<_, _>>()
            .map(Value::List),
        scalar => Ok(Value::Number(f(scalar.as_f64()?))),
    }
}
