//! Render interception: the hook that turns every newly shown figure into
//! exactly one artifact line.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{self, Write};
use std::rc::Rc;

use crate::artifact::emit;
use crate::assemble::assemble;
use crate::figure::{Figure, FigureId, Pyplot, RenderHook};
use crate::log::{debug, warn};
use crate::raster::RenderOptions;

/// Chart pipeline run for each figure the first time it is shown
pub struct ChartPipeline<W: Write> {
    processed: HashSet<FigureId>,
    out: W,
    options: RenderOptions,
}

impl<W: Write> ChartPipeline<W> {
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self {
            processed: HashSet::new(),
            out,
            options,
        }
    }

    pub fn is_processed(&self, id: FigureId) -> bool {
        self.processed.contains(&id)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Assemble and emit one figure unless it was already processed
    pub fn process(&mut self, figure: &Figure) {
        if self.processed.contains(&figure.number) {
            debug!(figure = figure.number, "already processed");
            return;
        }
        let record = assemble(figure, &self.options);
        if let Err(err) = emit(&mut self.out, record) {
            warn!("Error emitting chart for figure {}: {}", figure.number, err);
        }
        self.processed.insert(figure.number);
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderHook for ChartPipeline<W> {
    fn on_render(&mut self, figures: &[&Figure]) {
        for figure in figures {
            self.process(figure);
        }
    }
}

/// Install a pipeline writing to `out` on `plt`. Returns the shared pipeline,
/// or `None` if a hook was already installed.
pub fn install<W: Write + 'static>(
    plt: &mut Pyplot,
    out: W,
    options: RenderOptions,
) -> Option<Rc<RefCell<ChartPipeline<W>>>> {
    let pipeline = Rc::new(RefCell::new(ChartPipeline::new(out, options)));
    plt.register_render_hook(Box::new(pipeline.clone()))
        .then_some(pipeline)
}

/// A writer shared by several owners: the pipeline, program output and
/// tests reading back what was written.
#[derive(Debug, Default)]
pub struct SharedWriter<W>(Rc<RefCell<W>>);

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<W> SharedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }

    /// Run `f` on the shared writer
    pub fn with<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl SharedWriter<Vec<u8>> {
    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.borrow_mut().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ARTIFACT_PREFIX;
    use crate::figure::LineOptions;

    fn options() -> RenderOptions {
        RenderOptions {
            load_system_fonts: false,
            ..Default::default()
        }
    }

    #[test]
    fn each_figure_is_emitted_once() {
        let out = SharedWriter::new(Vec::new());
        let mut plt = Pyplot::new();
        let pipeline = install(&mut plt, out.clone(), options()).unwrap();
        plt.gca().plot(vec![0.0, 1.0], vec![0.0, 1.0], LineOptions::default()).unwrap();
        assert_eq!(plt.show(), 1);
        assert_eq!(plt.show(), 1);
        assert_eq!(out.contents().matches(ARTIFACT_PREFIX).count(), 1);
        assert!(pipeline.borrow().is_processed(1));

        plt.figure(None, None);
        plt.show();
        assert_eq!(out.contents().matches(ARTIFACT_PREFIX).count(), 2);
        assert_eq!(pipeline.borrow().processed_count(), 2);
    }

    #[test]
    fn second_install_is_refused() {
        let mut plt = Pyplot::new();
        assert!(install(&mut plt, Vec::new(), options()).is_some());
        assert!(install(&mut plt, Vec::new(), options()).is_none());
    }
}
