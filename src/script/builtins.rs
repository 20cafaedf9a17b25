//! Global builtins: math, sequences, printing

use std::f64::consts::PI;

use super::interp::{Args, Interpreter};
use super::value::{Value, map_numbers};
use super::Raised;
use crate::errors::{ErrorKind, ScriptError};
use crate::harness::USER_CODE_SOURCE;

const FUNCTIONS: &[&str] = &[
    "range",
    "linspace",
    "len",
    "sum",
    "min",
    "max",
    "abs",
    "sin",
    "cos",
    "exp",
    "sqrt",
    "log",
    "str",
    "print",
    "error",
    "run_user_code",
];

/// Resolve a name that is not bound in any scope
pub(crate) fn lookup(name: &str) -> Option<Value> {
    match name {
        "nan" => Some(Value::Number(f64::NAN)),
        "inf" => Some(Value::Number(f64::INFINITY)),
        "pi" => Some(Value::Number(PI)),
        "plt" => Some(Value::Module("plt")),
        _ => FUNCTIONS
            .iter()
            .copied()
            .find(|f| *f == name)
            .map(|f| Value::Builtin { module: None, name: f }),
    }
}

pub(crate) fn call(interp: &mut Interpreter, name: &str, args: Args) -> Result<Value, ScriptError> {
    match name {
        "run_user_code" => {
            let encoded = args
                .require(name, 0, "code")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .map_err(|e| interp.raise(e))?;
            interp.run_encoded(USER_CODE_SOURCE, &encoded)?;
            Ok(Value::None)
        }
        "print" => {
            let line = print_line(&args).map_err(|e| interp.raise(e))?;
            interp.write_line(&line).map_err(|e| interp.raise(e))?;
            Ok(Value::None)
        }
        "error" => {
            let message = args.positional.first().map(Value::to_string).unwrap_or_default();
            Err(interp.raise(Raised::new(ErrorKind::RuntimeError, message)))
        }
        _ => pure(name, &args).map_err(|e| interp.raise(e)),
    }
}

fn print_line(args: &Args) -> Result<String, Raised> {
    args.check("print", usize::MAX, &["sep"])?;
    let sep = match args.keyword("sep") {
        Some(v) => v.as_str()?.to_string(),
        None => " ".to_string(),
    };
    let parts: Vec<String> = args.positional.iter().map(Value::to_string).collect();
    Ok(parts.join(&sep))
}

/// Builtins that only compute
fn pure(name: &str, args: &Args) -> Result<Value, Raised> {
    let first = || args.require(name, 0, "x");
    match name {
        "range" => range(args),
        "linspace" => {
            args.check(name, 3, &["start", "stop", "num"])?;
            let start = args.require(name, 0, "start")?.as_f64()?;
            let stop = args.require(name, 1, "stop")?.as_f64()?;
            let num = match args.get(2, "num") {
                Some(v) => v.as_int()?,
                None => 50,
            };
            if num < 0 {
                return Err(Raised::value(format!(
                    "Number of samples, {num}, must be non-negative."
                )));
            }
            Ok(Value::numbers(linspace(start, stop, num as usize)))
        }
        "len" => match first()? {
            Value::List(items) => Ok(Value::Number(items.len() as f64)),
            Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(Raised::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        },
        "sum" => Ok(Value::Number(first()?.as_f64_list()?.iter().sum())),
        "min" | "max" => {
            let values = match args.positional.as_slice() {
                [single] => single.as_f64_list()?,
                many => many.iter().map(Value::as_f64).collect::<Result<_, _>>()?,
            };
            let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            values
                .into_iter()
                .reduce(pick)
                .map(Value::Number)
                .ok_or_else(|| Raised::value(format!("{name}() arg is an empty sequence")))
        }
        "abs" => map_numbers(first()?, f64::abs),
        "sin" => map_numbers(first()?, f64::sin),
        "cos" => map_numbers(first()?, f64::cos),
        "exp" => map_numbers(first()?, f64::exp),
        "sqrt" => map_numbers(first()?, f64::sqrt),
        "log" => map_numbers(first()?, f64::ln),
        "str" => Ok(Value::Str(first()?.to_string())),
        _ => Err(Raised::new(
            ErrorKind::NameError,
            format!("name '{name}' is not defined"),
        )),
    }
}

fn range(args: &Args) -> Result<Value, Raised> {
    args.check("range", 3, &[])?;
    let ints: Vec<i64> = args
        .positional
        .iter()
        .map(Value::as_int)
        .collect::<Result<_, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(Raised::type_error(format!(
                "range expected at least 1 argument, got {}",
                ints.len()
            )));
        }
    };
    if step == 0 {
        return Err(Raised::value("range() arg 3 must not be zero"));
    }
    let mut values = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        values.push(i as f64);
        i += step;
    }
    Ok(Value::numbers(values))
}

/// `num` evenly spaced samples from `start` to `stop` inclusive
pub(crate) fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positional(values: &[f64]) -> Args {
        Args {
            positional: values.iter().map(|v| Value::Number(*v)).collect(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn ranges() {
        assert_eq!(range(&positional(&[3.0])).unwrap(), Value::numbers([0.0, 1.0, 2.0]));
        assert_eq!(range(&positional(&[5.0, 0.0, -2.0])).unwrap(), Value::numbers([5.0, 3.0, 1.0]));
        assert_eq!(range(&positional(&[1.0, 1.0])).unwrap(), Value::List(vec![]));
        let err = range(&positional(&[0.0, 3.0, 0.0])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueError);
        let err = range(&positional(&[1.5])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }

    #[test]
    fn linspace_hits_both_ends() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn elementwise_math() {
        let v = pure("sqrt", &Args {
            positional: vec![Value::numbers([4.0, 9.0])],
            keywords: Vec::new(),
        })
        .unwrap();
        assert_eq!(v, Value::numbers([2.0, 3.0]));
    }

    #[test]
    fn constants_and_modules_resolve() {
        assert_eq!(lookup("pi"), Some(Value::Number(PI)));
        assert_eq!(lookup("plt"), Some(Value::Module("plt")));
        assert_eq!(lookup("len"), Some(Value::Builtin { module: None, name: "len" }));
        assert_eq!(lookup("plot"), None);
    }
}
