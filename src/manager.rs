//! A grid of subplots drawn through a single active-subplot cursor.

use std::{
    borrow::Borrow,
    ffi::OsStr,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};
use crate::{
    bounds,
    config::PlotConfig,
    grid::Grid,
    mpl::{self, Axes, Data, Figure, Line2D, PlotOptions, Property, Scale},
    Error,
};

/// Backends [`PlotManager`] accepts (compared case-insensitively).
/// "Agg" renders without a window and is meant for scripts and tests.
pub const SUPPORTED_BACKENDS: &[&str] =
    &["TkAgg", "Qt5Agg", "Qt6Agg", "QtAgg", "Agg"];

/// Resolution used by [`Savefig`] unless told otherwise.
pub const DEFAULT_DPI: f64 = 300.;

#[derive(Debug)]
struct Subplot {
    axes: Axes,
    // Lines plotted through the manager, oldest first.
    lines: Vec<Line2D>,
}

/// Which axes [`PlotManager::link_axes`] shares between subplots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    X,
    Y,
    XY,
}

/// Owns a figure with a `rows` × `cols` grid of subplots.  Plotting,
/// zooming and titles apply to the *active* subplot, initially
/// `(0, 0)`.
///
/// # Example
///
/// ```no_run
/// use plot_manager::PlotManager;
/// let mut pm = PlotManager::new(1, 2)?;
/// pm.xy(&[1., 2., 3.], &[1., 4., 9.]).legend("squares").plot()?;
/// pm.set_active_subplot(0, 1)?;
/// pm.xy(&[1., 10., 100.], &[1., 2., 3.]).semilogx()?;
/// pm.save().to_file("target/two_plots.png")?;
/// # Ok::<(), plot_manager::Error>(())
/// ```
#[derive(Debug)]
pub struct PlotManager {
    figure: Figure,
    grid: Grid<Subplot>,
    config: PlotConfig,
    closed: Arc<AtomicBool>,
    output_size: Option<(f64, f64)>,
}

/// Whether `backend` is one of [`SUPPORTED_BACKENDS`].
pub fn is_supported_backend(backend: &str) -> bool {
    SUPPORTED_BACKENDS.iter().any(|b| b.eq_ignore_ascii_case(backend))
}

fn check_backend() -> Result<(), Error> {
    let backend = mpl::backend()?;
    if is_supported_backend(&backend) {
        return Ok(());
    }
    warn!(%backend, "refusing unsupported matplotlib backend");
    Err(Error::UnsupportedBackend { backend, supported: SUPPORTED_BACKENDS })
}

/// Create the subplots of `figure` and style them after `config`.
fn layout(figure: &Figure, rows: usize, cols: usize, config: &PlotConfig)
          -> Result<Grid<Subplot>, Error> {
    let labels = config.font_settings("xlabels")?;
    let background = config.background_color()?;
    let cycle = config.line_cycle()?;
    Grid::try_from_fn(rows, cols, |r, c| {
        let axes = figure.add_subplot(rows, cols, r * cols + c + 1)?;
        axes.set_tick_labelsize(labels.fontsize)?;
        axes.set_xlabel("X Label", &labels)?;
        axes.set_ylabel("Y Label", &labels)?;
        axes.set_facecolor(background)?;
        axes.set_prop_cycle(&cycle)?;
        Ok(Subplot { axes, lines: vec![] })
    })
}

impl PlotManager {
    /// Create a manager styled with the default configuration.
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        Self::with_config(rows, cols, PlotConfig::default())
    }

    /// Create a manager whose subplots are styled after `config`.
    ///
    /// Return an error if Matplotlib is not present on the system, if
    /// its backend is not one of [`SUPPORTED_BACKENDS`], if the grid is
    /// empty or if `config` holds invalid values.
    pub fn with_config(
        rows: usize, cols: usize, config: PlotConfig) -> Result<Self, Error> {
        check_backend()?;
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyGrid { rows, cols });
        }
        let figure = Figure::new()?;
        let grid = match layout(&figure, rows, cols, &config) {
            Ok(grid) => grid,
            Err(e) => {
                // Do not leave a half-built figure registered with pyplot.
                let _ = figure.close();
                return Err(e);
            }
        };
        let closed = Arc::new(AtomicBool::new(false));
        figure.on_close(Arc::clone(&closed))?;
        debug!(rows, cols, "created plot manager");
        Ok(PlotManager { figure, grid, config, closed, output_size: None })
    }

    pub fn rows(&self) -> usize { self.grid.rows() }

    pub fn cols(&self) -> usize { self.grid.cols() }

    pub fn config(&self) -> &PlotConfig { &self.config }

    pub fn figure(&self) -> &Figure { &self.figure }

    /// Axes of the subplot at (`row`, `col`).
    pub fn axes(&self, row: usize, col: usize) -> Result<&Axes, Error> {
        Ok(&self.grid.get(row, col)?.axes)
    }

    pub fn active_axes(&self) -> &Axes {
        &self.grid.active_cell().axes
    }

    /// Direct plotting, zooming and titles to the subplot at
    /// (`row`, `col`).  It also becomes pyplot's current axes.
    pub fn set_active_subplot(
        &mut self, row: usize, col: usize) -> Result<(), Error> {
        self.grid.set_active(row, col)?;
        mpl::sca(self.active_axes())?;
        debug!(row, col, "active subplot changed");
        Ok(())
    }

    /// Indices (row, column) of the active subplot.
    pub fn active_subplot(&self) -> (usize, usize) {
        self.grid.active()
    }

    /// Plot `y` versus `x` on the active subplot.
    ///
    /// The chain ends with [`XY::plot`], [`XY::semilogx`],
    /// [`XY::semilogy`] or [`XY::loglog`].
    #[must_use]
    pub fn xy<'a, D>(&'a mut self, x: &'a D, y: &'a D) -> XY<'a, D>
    where D: Data + ?Sized {
        XY { pm: self, options: PlotOptions::new(), legend: false,
             x: Some(x), y }
    }

    /// Plot `y` versus its indices on the active subplot.
    #[must_use]
    pub fn y<'a, D>(&'a mut self, y: &'a D) -> XY<'a, D>
    where D: Data + ?Sized {
        XY { pm: self, options: PlotOptions::new(), legend: false,
             x: None, y }
    }

    /// Plot the (x, y) coordinates coming from `xy` on the active
    /// subplot.
    #[must_use]
    pub fn xy_from<'a, I>(&'a mut self, xy: I) -> XYFrom<'a, I>
    where I: IntoIterator,
          <I as IntoIterator>::Item: Borrow<(f64, f64)> {
        XYFrom { pm: self, options: PlotOptions::new(), legend: false,
                 data: xy }
    }

    fn draw<D>(&mut self, scale: Scale, x: Option<&D>, y: &D,
               options: &PlotOptions<'_>, legend: bool)
               -> Result<&Line2D, Error>
    where D: Data + ?Sized {
        if let Some(x) = x {
            if x.len() != y.len() {
                return Err(Error::LengthMismatch { x: x.len(), y: y.len() });
            }
        }
        let (row, col) = self.grid.active();
        let line = self.active_axes().plot(scale, x, y, options)?;
        // Once on the axes, the line is tracked even if redrawing fails.
        self.grid.active_cell_mut().lines.push(line);
        if legend {
            self.active_axes().legend()?;
        }
        self.figure.draw_idle()?;
        debug!(row, col, ?scale, points = y.len(), "plotted line");
        let lines = &self.grid.active_cell().lines;
        Ok(&lines[lines.len() - 1])
    }

    /// Number of lines plotted on the active subplot.
    pub fn num_lines(&self) -> usize {
        self.grid.active_cell().lines.len()
    }

    /// Line number `n` of the active subplot, counting from 1 in the
    /// order they were plotted.
    pub fn line(&self, n: usize) -> Result<&Line2D, Error> {
        let lines = &self.grid.active_cell().lines;
        if n == 0 || n > lines.len() {
            return Err(Error::LineOutOfRange {
                requested: n, available: lines.len() });
        }
        Ok(&lines[n - 1])
    }

    /// Redraw the legend of the active subplot, e.g. after
    /// [`Line2D::set_label`].
    pub fn legend(&mut self) -> Result<(), Error> {
        self.active_axes().legend()?;
        self.figure.draw_idle()
    }

    /// Set the x-axis limits of the active subplot.  If `autozoom_y`
    /// is true, also fit the y-axis to the points of all its lines
    /// whose abscissa lies in the new range (if there are any).
    pub fn zoom_x(&mut self, xmin: f64, xmax: f64, autozoom_y: bool)
                  -> Result<(), Error> {
        let axes = self.active_axes().clone();
        axes.set_xlim(xmin, xmax)?;
        debug!(xmin, xmax, "zoomed x-axis");
        if autozoom_y {
            let ranges = axes.lines()?.iter()
                .map(|l| -> Result<_, Error> {
                    Ok(bounds::visible_range(
                        &l.xdata()?, &l.ydata()?, xmin, xmax)) })
                .collect::<Result<Vec<_>, Error>>()?;
            if let Some(r) = bounds::union_all(ranges) {
                return self.zoom_y(Some(r.lo), Some(r.hi));
            }
        }
        self.figure.draw_idle()
    }

    /// Set the y-axis limits of the active subplot.  A missing bound is
    /// taken from the data of the subplot's lines; without lines,
    /// nothing changes.
    pub fn zoom_y(&mut self, ymin: Option<f64>, ymax: Option<f64>)
                  -> Result<(), Error> {
        let axes = self.active_axes().clone();
        let (lo, hi) = match (ymin, ymax) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => {
                let ranges = axes.lines()?.iter()
                    .map(|l| -> Result<_, Error> {
                        Ok(bounds::data_range(&l.ydata()?)) })
                    .collect::<Result<Vec<_>, Error>>()?;
                let Some(r) = bounds::union_all(ranges) else {
                    return Ok(());
                };
                (ymin.unwrap_or(r.lo), ymax.unwrap_or(r.hi))
            }
        };
        axes.set_ylim(lo, hi)?;
        debug!(ymin = lo, ymax = hi, "zoomed y-axis");
        self.figure.draw_idle()
    }

    /// Share the x and/or y axes of every subplot with those of
    /// subplot (0, 0).  Matplotlib refuses to share an axis twice.
    pub fn link_axes(&mut self, link: Link) -> Result<(), Error> {
        let first = self.grid.get(0, 0)?.axes.clone();
        for s in self.grid.iter().skip(1) {
            if matches!(link, Link::X | Link::XY) {
                s.axes.sharex(&first)?;
            }
            if matches!(link, Link::Y | Link::XY) {
                s.axes.sharey(&first)?;
            }
        }
        debug!(?link, "linked axes");
        self.figure.draw_idle()
    }

    /// Set the displayed figure size, in inches.
    pub fn set_figure_size(&mut self, width: f64, height: f64)
                           -> Result<(), Error> {
        self.figure.set_size_inches(width, height)?;
        self.figure.draw_idle()
    }

    /// Displayed figure size (width, height) in inches.
    pub fn figure_size(&self) -> Result<(f64, f64), Error> {
        self.figure.size_inches()
    }

    /// Size (in inches) the figure takes only while being saved.
    pub fn set_output_size(&mut self, width: f64, height: f64) {
        self.output_size = Some((width, height));
    }

    /// Title the active subplot with the `title` font of the
    /// configuration.  Use '\n' for line breaks.
    pub fn set_subplot_title(&mut self, title: &str) -> Result<(), Error> {
        self.subplot_title(title, None)
    }

    /// Same as [`PlotManager::set_subplot_title`] with the title `pad`
    /// points above the axes.
    pub fn set_subplot_title_with_pad(&mut self, title: &str, pad: f64)
                                      -> Result<(), Error> {
        self.subplot_title(title, Some(pad))
    }

    fn subplot_title(&mut self, title: &str, pad: Option<f64>)
                     -> Result<(), Error> {
        let font = self.config.font_settings("title")?;
        self.active_axes().set_title(title, &font, pad)?;
        self.figure.draw_idle()
    }

    /// Title the whole figure with the `title` font of the
    /// configuration.
    pub fn set_figure_title(&mut self, title: &str) -> Result<(), Error> {
        let font = self.config.font_settings("title")?;
        self.figure.suptitle(title, &font)?;
        self.figure.draw_idle()
    }

    /// Export the figure.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # let pm = plot_manager::PlotManager::new(1, 1)?;
    /// pm.save().dpi(150.).filetypes(["png", "pdf"]).to_file("plot.pdf")?;
    /// # Ok::<(), plot_manager::Error>(())
    /// ```
    pub fn save(&self) -> Savefig<'_> {
        Savefig { pm: self, dpi: Some(DEFAULT_DPI), filetypes: None }
    }

    /// Whether the figure window was closed (by the user or
    /// [`PlotManager::close`]).
    pub fn is_window_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the figure.  It can no longer be saved afterwards.
    pub fn close(&mut self) -> Result<(), Error> {
        self.figure.close()?;
        self.closed.store(true, Ordering::SeqCst);
        info!("figure closed");
        Ok(())
    }
}

/// Declare methods to set the options assuming `self.options` and
/// `self.legend` exist.
macro_rules! set_plotoptions { () => {
    /// Matplotlib format string such as "r." or "--".
    #[must_use]
    pub fn fmt(mut self, fmt: &'a str) -> Self {
        self.options.fmt = fmt;
        self
    }

    #[must_use]
    pub fn animated(mut self) -> Self {
        self.options.animated = true;
        self
    }

    #[must_use]
    pub fn antialiased(mut self, b: bool) -> Self {
        self.options.antialiased = b;
        self
    }

    /// Label the line without showing a legend.
    #[must_use]
    pub fn label(mut self, label: &'a str) -> Self {
        self.options.label = label;
        self
    }

    /// Label the line and show the legend of the subplot.
    #[must_use]
    pub fn legend(mut self, label: &'a str) -> Self {
        self.options.label = label;
        self.legend = !label.is_empty();
        self
    }

    #[must_use]
    pub fn linewidth(mut self, w: f64) -> Self {
        self.options.linewidth = Some(w);
        self
    }

    #[must_use]
    pub fn color(mut self, color: &'a str) -> Self {
        self.options.color = Some(color);
        self
    }

    #[must_use]
    pub fn linestyle(mut self, style: &'a str) -> Self {
        self.options.linestyle = Some(style);
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: &'a str) -> Self {
        self.options.marker = Some(marker);
        self
    }

    /// Any other property of Matplotlib's `Line2D`, for example
    /// `.kw("alpha", 0.5)` or `.kw("drawstyle", "steps")`.
    #[must_use]
    pub fn kw(mut self, name: &'a str, value: impl Into<Property<'a>>)
              -> Self {
        self.options.extra.push((name, value.into()));
        self
    }
}}

/// Line being set up by [`PlotManager::xy`] or [`PlotManager::y`].
pub struct XY<'a, D>
where D: ?Sized {
    pm: &'a mut PlotManager,
    options: PlotOptions<'a>,
    legend: bool,
    x: Option<&'a D>,
    y: &'a D,
}

impl<'a, D> XY<'a, D>
where D: Data + ?Sized {
    set_plotoptions!();

    fn draw(self, scale: Scale) -> Result<&'a Line2D, Error> {
        let XY { pm, options, legend, x, y } = self;
        pm.draw(scale, x, y, &options, legend)
    }

    /// Draw with linear axes.
    pub fn plot(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::Linear)
    }

    /// Draw with a logarithmic x-axis.
    pub fn semilogx(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogX)
    }

    /// Draw with a logarithmic y-axis.
    pub fn semilogy(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogY)
    }

    /// Draw with both axes logarithmic.
    pub fn loglog(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogLog)
    }
}

/// Line being set up by [`PlotManager::xy_from`].
pub struct XYFrom<'a, I> {
    pm: &'a mut PlotManager,
    options: PlotOptions<'a>,
    legend: bool,
    data: I,
}

impl<'a, I> XYFrom<'a, I>
where I: IntoIterator,
      <I as IntoIterator>::Item: Borrow<(f64, f64)> {
    set_plotoptions!();

    fn draw(self, scale: Scale) -> Result<&'a Line2D, Error> {
        let XYFrom { pm, options, legend, data } = self;
        let data = data.into_iter();
        let n = data.size_hint().0;
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for di in data {
            let &(xi, yi) = di.borrow();
            x.push(xi);
            y.push(yi);
        }
        pm.draw(scale, Some(x.as_slice()), y.as_slice(), &options, legend)
    }

    pub fn plot(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::Linear)
    }

    pub fn semilogx(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogX)
    }

    pub fn semilogy(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogY)
    }

    pub fn loglog(self) -> Result<&'a Line2D, Error> {
        self.draw(Scale::LogLog)
    }
}


/// Settings to export a figure, see [`PlotManager::save`].
pub struct Savefig<'a> {
    pm: &'a PlotManager,
    dpi: Option<f64>,
    filetypes: Option<Vec<String>>,
}

impl<'a> Savefig<'a> {
    /// Resolution in dots per inch.  A non-positive value selects
    /// Matplotlib's own default.
    pub fn dpi(&mut self, dpi: f64) -> &mut Self {
        if dpi > 0. {
            self.dpi = Some(dpi);
        } else {
            self.dpi = None;
        }
        self
    }

    /// Only accept file names with one of these extensions (compared
    /// case-insensitively, with or without the leading dot).
    pub fn filetypes<I, S>(&mut self, types: I) -> &mut Self
    where I: IntoIterator<Item = S>,
          S: Into<String> {
        self.filetypes = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Write the figure to `path`; the format follows its extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if self.pm.is_window_closed() {
            return Err(Error::WindowClosed);
        }
        if let Some(allowed) = &self.filetypes {
            let ext = path.extension()
                .and_then(OsStr::to_str)
                .unwrap_or("")
                .to_lowercase();
            if !allowed.iter().any(|a| {
                a.trim_start_matches('.').eq_ignore_ascii_case(&ext) }) {
                return Err(Error::UnsupportedFileType {
                    extension: ext, allowed: allowed.clone() });
            }
        }
        let fig = &self.pm.figure;
        let displayed = match self.pm.output_size {
            Some((w, h)) => {
                let size = fig.size_inches()?;
                fig.set_size_inches(w, h)?;
                Some(size)
            }
            None => None,
        };
        let saved = fig.savefig(path, self.dpi);
        if let Some((w, h)) = displayed {
            fig.set_size_inches(w, h)?;
        }
        saved?;
        info!(path = %path.display(), dpi = ?self.dpi, "saved figure");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert!(is_supported_backend("TkAgg"));
        assert!(is_supported_backend("agg"));
        assert!(is_supported_backend("qtagg"));
        assert!(!is_supported_backend("module://matplotlib_inline.backend_inline"));
        assert!(!is_supported_backend("WebAgg"));
        assert!(!is_supported_backend(""));
    }
}
