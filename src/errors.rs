//! Error types with rich diagnostics using miette
//!
//! Script syntax errors carry source spans of the user program; runtime
//! errors carry the call stack captured where they were raised.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::script::Frame;

// ============================================================================
// Script Errors
// ============================================================================

/// Kinds of failures a figure script can raise, named after the exception
/// classes users of plotting notebooks already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    NameError,
    AttributeError,
    TypeError,
    ValueError,
    IndexError,
    ZeroDivisionError,
    RecursionError,
    RuntimeError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::NameError => "NameError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::RuntimeError => "RuntimeError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while parsing or running a figure script
#[derive(Error, Diagnostic, Debug)]
pub enum ScriptError {
    #[error("invalid syntax: {message}")]
    #[diagnostic(code(chartlens::script::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        /// Frames active when the program was compiled (the caller's, never
        /// the program's own)
        stack: Vec<Frame>,
    },

    #[error("{kind}: {message}")]
    #[diagnostic(code(chartlens::script::runtime))]
    Runtime {
        kind: ErrorKind,
        message: String,
        /// Innermost frame last
        stack: Vec<Frame>,
    },
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptError::Syntax { .. } => ErrorKind::SyntaxError,
            ScriptError::Runtime { kind, .. } => *kind,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ScriptError::Syntax { message, .. } => message.clone(),
            ScriptError::Runtime { message, .. } => message.clone(),
        }
    }

    pub fn stack(&self) -> &[Frame] {
        match self {
            ScriptError::Syntax { stack, .. } => stack,
            ScriptError::Runtime { stack, .. } => stack,
        }
    }
}

// ============================================================================
// Plotting Library Errors
// ============================================================================

/// A plotting call rejected its arguments
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{message}")]
#[diagnostic(code(chartlens::plot))]
pub struct PlotError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PlotError {
    pub fn value(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ValueError,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RuntimeError,
            message: message.into(),
        }
    }
}

// ============================================================================
// Extraction Errors
// ============================================================================

/// Errors from a chart-type extractor. These never escape figure assembly:
/// the subplot proceeds with no elements.
#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum ExtractError {
    #[error("box {index} has an empty path")]
    #[diagnostic(code(chartlens::extract::empty_path))]
    EmptyPath { index: usize },

    #[error("box {index} has no median line")]
    #[diagnostic(
        code(chartlens::extract::missing_median),
        help("the box path has fewer than five distinct levels, so a median line is required")
    )]
    MissingMedian { index: usize },

    #[error("wedge {index} has a non-finite angle")]
    #[diagnostic(code(chartlens::extract::invalid_wedge))]
    InvalidWedge { index: usize },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur while rasterizing a figure
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("invalid figure size: {width}x{height} px")]
    #[diagnostic(code(chartlens::render::invalid_size))]
    InvalidSize { width: f64, height: f64 },

    #[error("SVG parse error: {0}")]
    #[diagnostic(code(chartlens::render::svg))]
    Svg(#[from] usvg::Error),

    #[error("PNG encoding failed: {0}")]
    #[diagnostic(code(chartlens::render::png))]
    Png(String),

    #[error("image error: {0}")]
    #[diagnostic(code(chartlens::render::image))]
    Image(#[from] image::ImageError),

    #[error("no layout region for subplot {index}")]
    #[diagnostic(code(chartlens::render::missing_region))]
    MissingRegion { index: usize },

    #[error("subplot could not be redrawn: {0}")]
    #[diagnostic(code(chartlens::render::plot))]
    Plot(#[from] PlotError),
}

// ============================================================================
// Artifact Errors
// ============================================================================

/// Errors writing an artifact line
#[derive(Error, Diagnostic, Debug)]
pub enum ArtifactError {
    #[error("JSON encoding failed: {0}")]
    #[diagnostic(code(chartlens::artifact::json))]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    #[diagnostic(code(chartlens::artifact::io))]
    Io(#[from] std::io::Error),
}
