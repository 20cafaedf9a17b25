//! Figure scripts: the small language user programs are written in.
//!
//! A script is parsed with the pest grammar in `figscript.pest` and run by a
//! tree-walking [`Interpreter`] that owns the pyplot state. Every frame the
//! interpreter enters is recorded so that errors carry the call stack from
//! where they were raised.

pub mod ast;
mod builtins;
mod interp;
pub mod parse;
mod plotting;
mod value;

pub use interp::{Interpreter, MAX_DEPTH};
pub use parse::parse;
pub use value::Value;

use crate::errors::ErrorKind;

/// Source name of frames that belong to the plotting library
pub const LIBRARY_SOURCE: &str = "<pyplot>";

/// Function name of a module's top-level frame
pub const MODULE_FRAME: &str = "<module>";

/// One entry of a call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Name of the program the frame executes, e.g. `<user_code>`
    pub source: String,
    pub function: String,
    /// 1-based line being executed; 0 for library frames
    pub line: usize,
}

impl Frame {
    pub fn new(source: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            function: function.into(),
            line: 0,
        }
    }
}

/// An error before the call stack is attached
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Raised {
    pub kind: ErrorKind,
    pub message: String,
}

impl Raised {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }
}

impl From<crate::errors::PlotError> for Raised {
    fn from(err: crate::errors::PlotError) -> Self {
        Self::new(err.kind, err.message)
    }
}
