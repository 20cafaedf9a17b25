//! Stateful pyplot-style interface: the set of open figures, the current
//! figure and axes, and the `show` entry point with its render hook.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::errors::PlotError;
use crate::log::debug;

use super::{Axes, Figure, FigureId, GridCell};

/// Observer invoked by `Pyplot::show` with every open figure, before the
/// figures are shown.
pub trait RenderHook {
    fn on_render(&mut self, figures: &[&Figure]);
}

impl<H: RenderHook> RenderHook for Rc<RefCell<H>> {
    fn on_render(&mut self, figures: &[&Figure]) {
        self.borrow_mut().on_render(figures);
    }
}

/// Open figures plus the "current" pointers the pyplot calls act on
pub struct Pyplot {
    figures: BTreeMap<FigureId, Figure>,
    current: Option<FigureId>,
    next_num: FigureId,
    hook: Option<Box<dyn RenderHook>>,
    /// Set while the hook runs so renders it triggers do not re-enter it
    in_show: bool,
}

impl Default for Pyplot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pyplot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pyplot")
            .field("figures", &self.figures.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("hooked", &self.hook.is_some())
            .finish()
    }
}

impl Pyplot {
    pub fn new() -> Self {
        Self {
            figures: BTreeMap::new(),
            current: None,
            next_num: 1,
            hook: None,
            in_show: false,
        }
    }

    /// Install the render hook. Only one hook may be installed; later calls
    /// leave the first in place and return `false`.
    pub fn register_render_hook(&mut self, hook: Box<dyn RenderHook>) -> bool {
        if self.hook.is_some() {
            debug!("render hook already installed");
            return false;
        }
        self.hook = Some(hook);
        true
    }

    /// Create or activate a figure. An explicit number that is already open
    /// is activated; otherwise a new figure is created. Numbers handed out
    /// automatically never repeat, even after `close`.
    pub fn figure(&mut self, num: Option<FigureId>, figsize: Option<(f64, f64)>) -> FigureId {
        if let Some(n) = num {
            if let Some(fig) = self.figures.get_mut(&n) {
                if let Some((w, h)) = figsize {
                    fig.size = (w, h);
                }
                self.current = Some(n);
                return n;
            }
        }
        let n = match num {
            Some(n) => n,
            None => self.next_num,
        };
        self.next_num = self.next_num.max(n + 1);
        let mut fig = Figure::new(n);
        if let Some((w, h)) = figsize {
            fig.size = (w, h);
        }
        debug!(figure = n, "new figure");
        self.figures.insert(n, fig);
        self.current = Some(n);
        n
    }

    /// Current figure, created on first use
    pub fn gcf(&mut self) -> &mut Figure {
        let n = match self.current.filter(|n| self.figures.contains_key(n)) {
            Some(n) => n,
            None => self.figure(None, None),
        };
        self.figures
            .entry(n)
            .or_insert_with(|| Figure::new(n))
    }

    /// Current axes of the current figure, created on first use
    pub fn gca(&mut self) -> &mut Axes {
        self.gcf().gca()
    }

    /// Select (creating if needed) the subplot at `index` of a rows×cols grid
    pub fn subplot(&mut self, rows: u32, cols: u32, index: u32) -> Result<(), PlotError> {
        let cell = GridCell::new(rows, cols, index)?;
        self.gcf().add_subplot(cell);
        Ok(())
    }

    /// New figure with a full rows×cols grid of axes; the first becomes current
    pub fn subplots(&mut self, rows: u32, cols: u32, figsize: Option<(f64, f64)>) -> Result<FigureId, PlotError> {
        // validate before creating the figure
        GridCell::new(rows, cols, 1)?;
        let n = self.figure(None, figsize);
        let fig = self.gcf();
        for index in 1..=rows * cols {
            fig.add_subplot(GridCell::new(rows, cols, index)?);
        }
        fig.set_current_axes(0)?;
        Ok(n)
    }

    /// Make the axes at zero-based `index` of the current figure current
    pub fn sca(&mut self, index: usize) -> Result<(), PlotError> {
        self.gcf().set_current_axes(index)
    }

    /// Close one figure, or the current one when `num` is `None`
    pub fn close(&mut self, num: Option<FigureId>) -> bool {
        let target = num.or(self.current);
        let closed = match target {
            Some(n) => self.figures.remove(&n).is_some(),
            None => false,
        };
        if closed && target == self.current {
            self.current = self.figures.keys().next_back().copied();
        }
        closed
    }

    pub fn close_all(&mut self) {
        self.figures.clear();
        self.current = None;
    }

    pub fn figure_numbers(&self) -> Vec<FigureId> {
        self.figures.keys().copied().collect()
    }

    pub fn get_figure(&self, num: FigureId) -> Option<&Figure> {
        self.figures.get(&num)
    }

    /// Display every open figure. The render hook sees all open figures
    /// first, then the figures are shown; returns how many were shown.
    pub fn show(&mut self) -> usize {
        if !self.in_show {
            if let Some(hook) = self.hook.as_mut() {
                self.in_show = true;
                let figures: Vec<&Figure> = self.figures.values().collect();
                hook.on_render(&figures);
                self.in_show = false;
            }
        }
        self.show_figures()
    }

    fn show_figures(&self) -> usize {
        debug!(count = self.figures.len(), "show");
        self.figures.len()
    }
}
