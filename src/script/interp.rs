//! Tree-walking interpreter for figure scripts

use std::collections::HashMap;
use std::io::Write;

use super::ast::*;
use super::value::{self, Value};
use super::{Frame, LIBRARY_SOURCE, MODULE_FRAME, Raised, builtins, parse, plotting};
use crate::errors::{ErrorKind, ScriptError};
use crate::figure::Pyplot;
use crate::log::debug;

/// Deepest call stack a script may build before `RecursionError`
pub const MAX_DEPTH: usize = 200;

/// Result of running one statement
enum Flow {
    Normal,
    Return(Value),
}

/// Evaluated call arguments
#[derive(Debug, Default)]
pub(crate) struct Args {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl Args {
    /// Argument at `pos`, or the keyword `name`
    pub fn get(&self, pos: usize, name: &str) -> Option<&Value> {
        self.keyword(name).or_else(|| self.positional.get(pos))
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Like `get`, but `None` values count as absent
    pub fn opt(&self, pos: usize, name: &str) -> Option<&Value> {
        self.get(pos, name).filter(|v| !matches!(v, Value::None))
    }

    pub fn require(&self, func: &str, pos: usize, name: &str) -> Result<&Value, Raised> {
        self.get(pos, name).ok_or_else(|| {
            Raised::type_error(format!("{func}() missing required argument: '{name}'"))
        })
    }

    /// Reject keywords outside `known` and more than `max` positionals
    pub fn check(&self, func: &str, max: usize, known: &[&str]) -> Result<(), Raised> {
        if let Some((k, _)) = self.keywords.iter().find(|(k, _)| !known.contains(&k.as_str())) {
            return Err(Raised::type_error(format!(
                "{func}() got an unexpected keyword argument '{k}'"
            )));
        }
        if self.positional.len() > max {
            return Err(Raised::type_error(format!(
                "{func}() takes at most {max} positional arguments but {} were given",
                self.positional.len()
            )));
        }
        Ok(())
    }
}

/// Runs scripts against one pyplot state
pub struct Interpreter {
    plt: Pyplot,
    out: Box<dyn Write>,
    globals: HashMap<String, Value>,
    /// One scope per active user-function call
    locals: Vec<HashMap<String, Value>>,
    frames: Vec<Frame>,
    sources: HashMap<String, String>,
}

impl Interpreter {
    /// An interpreter whose `print` output goes to `out`
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            plt: Pyplot::new(),
            out,
            globals: HashMap::new(),
            locals: Vec::new(),
            frames: Vec::new(),
            sources: HashMap::new(),
        }
    }

    pub fn pyplot(&self) -> &Pyplot {
        &self.plt
    }

    pub fn pyplot_mut(&mut self) -> &mut Pyplot {
        &mut self.plt
    }

    /// Source text of every program run so far, by source name
    pub fn sources(&self) -> &HashMap<String, String> {
        &self.sources
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Parse and run `source` as a top-level module named `name`. Syntax
    /// errors carry the frames of whoever asked for the run.
    pub fn run(&mut self, name: &str, source: &str) -> Result<(), ScriptError> {
        self.sources.insert(name.to_string(), source.to_string());
        let program = parse(name, source).map_err(|err| self.with_current_stack(err))?;
        debug!(source = name, statements = program.statements.len(), "running module");

        self.frames.push(Frame::new(name, MODULE_FRAME));
        let result = self.exec_block(&program.statements);
        self.frames.pop();
        match result? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(self.raise(Raised::new(
                ErrorKind::SyntaxError,
                "'return' outside function",
            ))),
        }
    }

    fn with_current_stack(&self, mut err: ScriptError) -> ScriptError {
        if let ScriptError::Syntax { stack, .. } = &mut err {
            *stack = self.frames.clone();
        }
        err
    }

    /// Attach the current call stack to an error
    pub(crate) fn raise(&self, raised: Raised) -> ScriptError {
        ScriptError::Runtime {
            kind: raised.kind,
            message: raised.message,
            stack: self.frames.clone(),
        }
    }

    /// Attach the current call stack plus a plotting-library frame
    fn raise_in_library(&self, function: &str, raised: Raised) -> ScriptError {
        let mut stack = self.frames.clone();
        stack.push(Frame::new(LIBRARY_SOURCE, function));
        ScriptError::Runtime {
            kind: raised.kind,
            message: raised.message,
            stack,
        }
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), Raised> {
        writeln!(self.out, "{line}")
            .and_then(|_| self.out.flush())
            .map_err(|e| Raised::new(ErrorKind::RuntimeError, format!("write failed: {e}")))
    }

    fn exec_block(&mut self, statements: &[Statement]) -> Result<Flow, ScriptError> {
        for stmt in statements {
            if let Flow::Return(v) = self.exec(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Statement) -> Result<Flow, ScriptError> {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = stmt.line;
        }
        match &stmt.kind {
            StatementKind::Let { name, value } => {
                let v = self.eval(value)?;
                self.assign(name, v);
            }
            StatementKind::Def(def) => self.assign(&def.name, Value::Function(def.clone())),
            StatementKind::For { var, iter, body } => {
                let items = match self.eval(iter)? {
                    Value::List(items) => items,
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    other => {
                        return Err(self.raise(Raised::type_error(format!(
                            "'{}' object is not iterable",
                            other.type_name()
                        ))));
                    }
                };
                for item in items {
                    self.assign(var, item);
                    if let Flow::Return(v) = self.exec_block(body)? {
                        return Ok(Flow::Return(v));
                    }
                    // the body may have moved the line; loops resume on their own
                    if let Some(frame) = self.frames.last_mut() {
                        frame.line = stmt.line;
                    }
                }
            }
            StatementKind::Return(expr) => {
                if self.locals.is_empty() {
                    return Err(self.raise(Raised::new(
                        ErrorKind::SyntaxError,
                        "'return' outside function",
                    )));
                }
                let v = match expr {
                    Some(e) => self.eval(e)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(v));
            }
            StatementKind::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, name: &str, v: Value) {
        match self.locals.last_mut() {
            Some(scope) => scope.insert(name.to_string(), v),
            None => self.globals.insert(name.to_string(), v),
        };
    }

    fn lookup(&self, name: &str) -> Result<Value, ScriptError> {
        if let Some(v) = self.locals.last().and_then(|scope| scope.get(name)) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(v.clone());
        }
        builtins::lookup(name).ok_or_else(|| {
            self.raise(Raised::new(
                ErrorKind::NameError,
                format!("name '{name}' is not defined"),
            ))
        })
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => items
                .iter()
                .map(|e| self.eval(e))
                .collect::<Result<_, _>>()
                .map(Value::List),
            Expr::Variable(name) => self.lookup(name),
            Expr::BinaryOp(l, op, r) => {
                let (l, r) = (self.eval(l)?, self.eval(r)?);
                value::binary(*op, &l, &r).map_err(|e| self.raise(e))
            }
            Expr::Neg(e) => {
                let v = self.eval(e)?;
                value::negate(&v).map_err(|e| self.raise(e))
            }
            Expr::Index { target, index } => {
                let (target, index) = (self.eval(target)?, self.eval(index)?);
                index_value(&target, &index).map_err(|e| self.raise(e))
            }
            Expr::Attr { target, name } => {
                let target = self.eval(target)?;
                attribute(&target, name).map_err(|e| self.raise(e))
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let mut evaluated = Args::default();
                for arg in args {
                    match arg {
                        Arg::Positional(e) => {
                            let v = self.eval(e)?;
                            evaluated.positional.push(v);
                        }
                        Arg::Keyword(name, e) => {
                            let v = self.eval(e)?;
                            evaluated.keywords.push((name.clone(), v));
                        }
                    }
                }
                self.call(callee, evaluated)
            }
        }
    }

    fn call(&mut self, callee: Value, args: Args) -> Result<Value, ScriptError> {
        match callee {
            Value::Function(def) => self.call_function(&def, args),
            Value::Builtin { module: Some(_), name } => {
                plotting::call(self, name, &args).map_err(|e| self.raise_in_library(name, e))
            }
            Value::Builtin { module: None, name } => builtins::call(self, name, args),
            other => Err(self.raise(Raised::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            )))),
        }
    }

    fn call_function(&mut self, def: &FunctionDef, args: Args) -> Result<Value, ScriptError> {
        if self.frames.len() >= MAX_DEPTH {
            return Err(self.raise(Raised::new(
                ErrorKind::RecursionError,
                "maximum recursion depth exceeded",
            )));
        }
        let scope = bind_params(def, args).map_err(|e| self.raise(e))?;

        self.frames.push(Frame::new(def.source.clone(), def.name.clone()));
        self.locals.push(scope);
        let result = self.exec_block(&def.body);
        self.locals.pop();
        self.frames.pop();
        match result? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::None),
        }
    }

    /// Decode and run a base64-encoded program as the user module
    pub(crate) fn run_encoded(&mut self, name: &str, encoded: &str) -> Result<(), ScriptError> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| self.raise(Raised::value(format!("Invalid base64-encoded string: {e}"))))?;
        let code = String::from_utf8(bytes).map_err(|e| {
            self.raise(Raised::value(format!("'utf-8' codec can't decode bytes: {e}")))
        })?;
        self.run(name, &code)
    }
}

fn bind_params(def: &FunctionDef, args: Args) -> Result<HashMap<String, Value>, Raised> {
    if args.positional.len() > def.params.len() {
        return Err(Raised::type_error(format!(
            "{}() takes {} positional arguments but {} were given",
            def.name,
            def.params.len(),
            args.positional.len()
        )));
    }
    let mut scope: HashMap<String, Value> = def
        .params
        .iter()
        .cloned()
        .zip(args.positional)
        .collect();
    for (name, v) in args.keywords {
        if !def.params.contains(&name) {
            return Err(Raised::type_error(format!(
                "{}() got an unexpected keyword argument '{name}'",
                def.name
            )));
        }
        if scope.insert(name.clone(), v).is_some() {
            return Err(Raised::type_error(format!(
                "{}() got multiple values for argument '{name}'",
                def.name
            )));
        }
    }
    let missing: Vec<String> = def
        .params
        .iter()
        .filter(|p| !scope.contains_key(*p))
        .map(|p| format!("'{p}'"))
        .collect();
    if !missing.is_empty() {
        return Err(Raised::type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            def.name,
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            missing.join(" and ")
        )));
    }
    Ok(scope)
}

fn index_value(target: &Value, index: &Value) -> Result<Value, Raised> {
    let len = match target {
        Value::List(items) => items.len(),
        Value::Str(s) => s.chars().count(),
        other => {
            return Err(Raised::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )));
        }
    };
    let i = index.as_int().map_err(|_| {
        Raised::type_error(format!(
            "{} indices must be integers, not {}",
            target.type_name(),
            index.type_name()
        ))
    })?;
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved >= len as i64 {
        return Err(Raised::new(
            ErrorKind::IndexError,
            format!("{} index out of range", target.type_name()),
        ));
    }
    let resolved = resolved as usize;
    match target {
        Value::List(items) => Ok(items[resolved].clone()),
        Value::Str(s) => Ok(Value::Str(s.chars().skip(resolved).take(1).collect())),
        _ => Err(Raised::type_error("not subscriptable")),
    }
}

fn attribute(target: &Value, name: &str) -> Result<Value, Raised> {
    match target {
        Value::Module(module) => plotting::lookup(name).ok_or_else(|| {
            Raised::new(
                ErrorKind::AttributeError,
                format!("module '{module}' has no attribute '{name}'"),
            )
        }),
        other => Err(Raised::new(
            ErrorKind::AttributeError,
            format!("'{}' object has no attribute '{name}'", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::SharedWriter;

    fn run(src: &str) -> (Interpreter, SharedWriter<Vec<u8>>, Result<(), ScriptError>) {
        let out = SharedWriter::new(Vec::new());
        let mut interp = Interpreter::new(Box::new(out.clone()));
        let result = interp.run("<user_code>", src);
        (interp, out, result)
    }

    #[test]
    fn functions_and_loops() {
        let (interp, out, result) = run(
            "def sq(v) { return v * v }\n\
             total = 0\n\
             for i in range(4) { total = total + sq(i) }\n\
             print(total, sq([1, 2]))\n",
        );
        result.unwrap();
        assert_eq!(interp.global("total"), Some(&Value::Number(14.0)));
        assert_eq!(out.contents(), "14 [1, 4]\n");
    }

    #[test]
    fn locals_do_not_leak() {
        let (interp, _, result) = run("def f() { inner = 1 }\nf()\n");
        result.unwrap();
        assert_eq!(interp.global("inner"), None);
    }

    #[test]
    fn errors_capture_the_stack() {
        let (_, _, result) = run("def f(a) {\n  return a / 0\n}\n\nf(1)\n");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ZeroDivisionError);
        let frames: Vec<(&str, usize)> = err.stack().iter().map(|f| (f.function.as_str(), f.line)).collect();
        assert_eq!(frames, vec![("<module>", 5), ("f", 2)]);
    }

    #[test]
    fn unbounded_recursion_is_stopped() {
        let (_, _, result) = run("def f(n) { return f(n + 1) }\nf(0)\n");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionError);
        assert_eq!(err.stack().len(), MAX_DEPTH);
    }

    #[test]
    fn name_and_index_errors() {
        let (_, _, result) = run("print(missing)");
        assert_eq!(result.unwrap_err().message(), "name 'missing' is not defined");
        let (_, _, result) = run("xs = [1, 2]\nxs[2]");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::IndexError);
        let (_, _, result) = run("xs = [1, 2]\nprint(xs[-1])");
        result.unwrap();
    }

    #[test]
    fn argument_binding() {
        let (_, out, result) = run("def f(a, b) { return a - b }\nprint(f(b = 1, a = 3))");
        result.unwrap();
        assert_eq!(out.contents(), "2\n");
        let (_, _, result) = run("def f(a, b) { return a }\nf(1)");
        assert_eq!(
            result.unwrap_err().message(),
            "f() missing 1 required positional argument: 'b'"
        );
    }

    #[test]
    fn library_errors_add_a_library_frame() {
        let (_, _, result) = run("plt.plot([1, 2, 3], [1, 2])");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
        let last = err.stack().last().unwrap();
        assert_eq!(last.source, LIBRARY_SOURCE);
        assert_eq!(last.function, "plot");
    }

    #[test]
    fn top_level_return_is_rejected() {
        let (_, _, result) = run("return 1");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::SyntaxError);
    }
}
