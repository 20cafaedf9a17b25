//! Render interception and chart classification for sandboxed plotting
//! sessions.
//!
//! A user program (a figure script) draws through a pyplot-style interface.
//! Every time it calls `show`, each figure not seen before is reduced to a
//! neutral scene of primitives, classified as a chart type, mined for its
//! elements and axis metadata, rasterized to PNG, and emitted as one
//! `dtn_artifact:` line on the program's standard output.

pub mod artifact;
pub mod assemble;
pub mod chart;
pub mod classify;
pub mod errors;
pub mod extract;
pub mod figure;
pub mod harness;
pub mod intercept;
pub mod log;
pub mod raster;
pub mod rerender;
pub mod scene;
pub mod script;
pub mod types;

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "figscript.pest"]
pub struct FigScriptParser;

pub use artifact::{ARTIFACT_PREFIX, emit};
pub use assemble::assemble;
pub use chart::{ChartRecord, ChartType, Elements};
pub use classify::classify;
pub use errors::{ErrorKind, ScriptError};
pub use harness::{Harness, prepare_bootstrap};
pub use intercept::{ChartPipeline, SharedWriter, install};
pub use raster::RenderOptions;

/// Run a figure script directly, without the bootstrap, and return what it
/// printed (artifact lines included).
pub fn run_script(source: &str, options: RenderOptions) -> Result<String, ScriptError> {
    let out = SharedWriter::new(Vec::new());
    let mut interp = script::Interpreter::new(Box::new(out.clone()));
    install(interp.pyplot_mut(), out.clone(), options);
    interp.run(harness::USER_CODE_SOURCE, source)?;
    Ok(out.contents())
}
