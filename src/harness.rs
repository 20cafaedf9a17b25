//! Execution harness: bootstrap a base64-encoded user program, install the
//! chart pipeline, and turn uncaught errors into a filtered traceback.

use std::io::Write;

use base64::Engine;

use crate::errors::ScriptError;
use crate::intercept::{SharedWriter, install};
use crate::log::debug;
use crate::raster::RenderOptions;
use crate::script::{Frame, Interpreter};

/// Source name of the decoded user program
pub const USER_CODE_SOURCE: &str = "<user_code>";

/// Source name of the bootstrap script
pub const BOOTSTRAP_SOURCE: &str = "<bootstrap>";

/// Placeholder the encoded program is substituted into
pub const ENCODED_CODE_PLACEHOLDER: &str = "{encoded_code}";

/// The fixed bootstrap script
pub const BOOTSTRAP_TEMPLATE: &str = "run_user_code(\"{encoded_code}\")\n";

/// Bootstrap script that runs `source`
pub fn prepare_bootstrap(source: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(source.as_bytes());
    BOOTSTRAP_TEMPLATE.replace(ENCODED_CODE_PLACEHOLDER, &encoded)
}

/// Runs bootstrap scripts with program output and artifacts on `out` and
/// tracebacks on `err`
pub struct Harness<O: Write + 'static, E: Write> {
    out: SharedWriter<O>,
    err: E,
    options: RenderOptions,
}

impl<O: Write + 'static, E: Write> Harness<O, E> {
    pub fn new(out: O, err: E, options: RenderOptions) -> Self {
        Self {
            out: SharedWriter::new(out),
            err,
            options,
        }
    }

    pub fn out(&self) -> &SharedWriter<O> {
        &self.out
    }

    pub fn err(&self) -> &E {
        &self.err
    }

    /// Run `bootstrap` to completion; returns the process exit status
    pub fn run(&mut self, bootstrap: &str) -> i32 {
        let mut interp = Interpreter::new(Box::new(self.out.clone()));
        install(interp.pyplot_mut(), self.out.clone(), self.options.clone());

        match interp.run(BOOTSTRAP_SOURCE, bootstrap) {
            Ok(()) => 0,
            Err(err) => {
                debug!(kind = err.kind().as_str(), "uncaught error");
                let text = traceback(&err, &interp);
                if let Err(io) = self.err.write_all(text.as_bytes()).and_then(|_| self.err.flush()) {
                    eprintln!("failed to write traceback: {io}");
                }
                1
            }
        }
    }
}

fn source_line(interp: &Interpreter, frame: &Frame) -> Option<String> {
    let source = interp.sources().get(&frame.source)?;
    let line = source.lines().nth(frame.line.checked_sub(1)?)?;
    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// Interpreter-style traceback. Only user-program frames are listed; when there
/// are none, every frame is.
pub fn traceback(err: &ScriptError, interp: &Interpreter) -> String {
    let stack = err.stack();
    let user: Vec<&Frame> = stack.iter().filter(|f| f.source == USER_CODE_SOURCE).collect();
    let frames: Vec<&Frame> = if user.is_empty() { stack.iter().collect() } else { user };

    let mut out = String::new();
    if !frames.is_empty() {
        out.push_str("Traceback (most recent call last):\n");
    }
    for frame in frames {
        if frame.line == 0 {
            out.push_str(&format!("  File \"{}\", in {}\n", frame.source, frame.function));
        } else {
            out.push_str(&format!(
                "  File \"{}\", line {}, in {}\n",
                frame.source, frame.line, frame.function
            ));
        }
        if let Some(line) = source_line(interp, frame) {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out.push_str(&format!("{}: {}\n", err.kind(), err.message()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions {
            load_system_fonts: false,
            ..Default::default()
        }
    }

    fn run(source: &str) -> (i32, String, String) {
        let mut harness = Harness::new(Vec::new(), Vec::new(), options());
        let status = harness.run(&prepare_bootstrap(source));
        let err = String::from_utf8_lossy(harness.err()).into_owned();
        (status, harness.out().contents(), err)
    }

    #[test]
    fn bootstrap_substitutes_the_payload() {
        let script = prepare_bootstrap("print(1)");
        assert_eq!(script, "run_user_code(\"cHJpbnQoMSk=\")\n");
    }

    #[test]
    fn clean_run() {
        let (status, out, err) = run("print(\"hello\")");
        assert_eq!(status, 0);
        assert_eq!(out, "hello\n");
        assert_eq!(err, "");
    }

    #[test]
    fn traceback_lists_only_user_frames() {
        let (status, _, err) = run("def f(xs) {\n  plt.plot(xs, [1])\n}\nf([1, 2])\n");
        assert_eq!(status, 1);
        assert_eq!(
            err,
            "Traceback (most recent call last):\n\
             \x20 File \"<user_code>\", line 4, in <module>\n\
             \x20   f([1, 2])\n\
             \x20 File \"<user_code>\", line 2, in f\n\
             \x20   plt.plot(xs, [1])\n\
             ValueError: x and y must have same first dimension, but have shapes (2,) and (1,)\n"
        );
    }

    #[test]
    fn syntax_errors_fall_back_to_the_full_stack() {
        let (status, _, err) = run("x = (1 +\n");
        assert_eq!(status, 1);
        assert!(err.contains("File \"<bootstrap>\", line 1, in <module>"), "{err}");
        assert!(!err.contains("<user_code>\", line"), "{err}");
        let last = err.lines().last().unwrap();
        assert!(last.starts_with("SyntaxError: "), "{last}");
        assert!(last.ends_with("(<user_code>, line 2)"), "{last}");
    }

    #[test]
    fn undecodable_payload() {
        let mut harness = Harness::new(Vec::new(), Vec::new(), options());
        let status = harness.run("run_user_code(\"%%%\")");
        assert_eq!(status, 1);
        let err = String::from_utf8_lossy(harness.err()).into_owned();
        assert!(err.lines().last().unwrap().starts_with("ValueError: Invalid base64"), "{err}");
    }

    #[test]
    fn shown_figures_become_artifacts() {
        let (status, out, _) = run("plt.plot([0, 1], [0, 1])\nplt.show()\nplt.show()\n");
        assert_eq!(status, 0);
        assert_eq!(out.matches(crate::artifact::ARTIFACT_PREFIX).count(), 1);
    }
}
