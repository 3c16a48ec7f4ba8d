//! Handles on the Matplotlib objects driven by the plot manager.
//!
//! Every method locks Python's GIL for the duration of the call.  Data
//! handed to Matplotlib is copied into fresh numpy arrays, so lines stay
//! valid after the Rust buffers are dropped.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use lazy_static::lazy_static;
use numpy::{PyArray1, ToPyArray};
use pyo3::{
    prelude::*,
    intern,
    exceptions::{PyFileNotFoundError, PyPermissionError, PyValueError},
    types::{IntoPyDict, PyCFunction, PyDict, PyTuple},
};
use crate::{
    config::{FontSettings, Rgba},
    Error,
};

/// Call the method `$m` of the Python object `$obj` (a `PyObject`),
/// optionally with keyword arguments (a `PyResult<Bound<PyDict>>`).
macro_rules! meth {
    ($obj: expr, $m: ident, $py: ident -> $args: expr, $kwargs: expr) => {
        Python::with_gil(|$py| -> Result<PyObject, Error> {
            let kwargs = $kwargs?;
            let r = $obj.bind($py).call_method(
                intern!($py, stringify!($m)), $args, Some(&kwargs))?;
            Ok(r.unbind())
        })
    };
    ($obj: expr, $m: ident, $py: ident -> $args: expr) => {
        Python::with_gil(|$py| -> Result<PyObject, Error> {
            let r = $obj.bind($py).call_method1(
                intern!($py, stringify!($m)), $args)?;
            Ok(r.unbind())
        })
    };
    ($obj: expr, $m: ident, $args: expr) => {
        meth!($obj, $m, py -> $args)
    };
}

/// Call the getter `$m` of `$obj` and convert its result.
macro_rules! get {
    ($obj: expr, $m: ident) => {
        Python::with_gil(|py| -> Result<_, Error> {
            Ok($obj.bind(py).call_method0(intern!(py, stringify!($m)))?
               .extract()?)
        })
    };
}

/// Import and return a handle to the module `$m`.
macro_rules! pyimport { ($m: literal) => {
    Python::with_gil(|py|
        PyModule::import_bound(py, $m).map(|m| m.unbind()))
}}

lazy_static! {
    static ref MATPLOTLIB: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib")
    };
    static ref PYPLOT: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.pyplot")
    };
    static ref NUMPY: Result<Py<PyModule>, PyErr> = {
        pyimport!("numpy")
    };
}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: ident) => {
    $m.as_ref().map_err(|_| Error::NoMatplotlib)
}}


/// Name of the active Matplotlib backend.
pub fn backend() -> Result<String, Error> {
    let pyplot = pymod!(PYPLOT)?;
    Python::with_gil(|py| {
        Ok(pyplot.bind(py).call_method0(intern!(py, "get_backend"))?
           .extract()?)
    })
}

/// Select the Matplotlib backend, e.g. "TkAgg" or "Agg" for a
/// headless session.  Call it before creating any
/// [`PlotManager`](crate::PlotManager).
pub fn use_backend(name: &str) -> Result<(), Error> {
    let matplotlib = pymod!(MATPLOTLIB)?;
    Python::with_gil(|py| {
        matplotlib.bind(py).call_method1(intern!(py, "use"), (name,))?;
        Ok(())
    })
}

/// Display all open figures and block until their windows are closed.
pub fn show() -> Result<(), Error> {
    let pyplot = pymod!(PYPLOT)?;
    Python::with_gil(|py| {
        pyplot.bind(py).call_method0(intern!(py, "show"))?;
        Ok(())
    })
}

/// Make `ax` pyplot's current axes.
pub(crate) fn sca(ax: &Axes) -> Result<(), Error> {
    let pyplot = pymod!(PYPLOT)?;
    Python::with_gil(|py| {
        pyplot.bind(py).call_method1(
            intern!(py, "sca"), (ax.ax.clone_ref(py),))?;
        Ok(())
    })
}

/// Convert any array-like Python object to a flat vector of floats.
fn float_vec(obj: PyObject) -> Result<Vec<f64>, Error> {
    let numpy = pymod!(NUMPY)?;
    Python::with_gil(|py| {
        let a = numpy.bind(py)
            .call_method1(intern!(py, "asarray"), (obj, "float64"))?;
        Ok(a.call_method0(intern!(py, "ravel"))?
           .call_method0(intern!(py, "tolist"))?
           .extract()?)
    })
}

fn font_kwargs<'py>(py: Python<'py>, font: &FontSettings)
                    -> PyResult<Bound<'py, PyDict>> {
    let kwargs = PyDict::new_bound(py);
    kwargs.set_item("fontname", &font.font)?;
    kwargs.set_item("fontsize", font.fontsize)?;
    Ok(kwargs)
}


/// Types that can be copied into a one dimensional numpy array.
pub trait Data {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>>;
}

impl Data for [f64] {
    fn len(&self) -> usize { <[f64]>::len(self) }

    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice_bound(py, self)
    }
}

impl Data for Vec<f64> {
    fn len(&self) -> usize { self.as_slice().len() }

    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.as_slice().to_numpy(py)
    }
}

impl<const N: usize> Data for [f64; N] {
    fn len(&self) -> usize { N }

    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.as_slice().to_numpy(py)
    }
}

impl<S> Data for ndarray::ArrayBase<S, ndarray::Ix1>
where S: ndarray::Data<Elem = f64> {
    fn len(&self) -> usize { self.dim() }

    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.to_pyarray_bound(py)
    }
}


/// Scale of the axes a line is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    /// Logarithmic x-axis.
    LogX,
    /// Logarithmic y-axis.
    LogY,
    LogLog,
}

impl Scale {
    fn method(self) -> &'static str {
        match self {
            Scale::Linear => "plot",
            Scale::LogX => "semilogx",
            Scale::LogY => "semilogy",
            Scale::LogLog => "loglog",
        }
    }
}

/// Value of a Matplotlib artist property, e.g. `alpha` or `drawstyle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
}

impl From<bool> for Property<'_> {
    fn from(b: bool) -> Self { Property::Bool(b) }
}

impl From<i64> for Property<'_> {
    fn from(i: i64) -> Self { Property::Int(i) }
}

impl From<i32> for Property<'_> {
    fn from(i: i32) -> Self { Property::Int(i.into()) }
}

impl From<f64> for Property<'_> {
    fn from(x: f64) -> Self { Property::Float(x) }
}

impl<'a> From<&'a str> for Property<'a> {
    fn from(s: &'a str) -> Self { Property::Str(s) }
}

impl Property<'_> {
    fn set_in(&self, kwargs: &Bound<'_, PyDict>, name: &str) -> PyResult<()> {
        match *self {
            Property::Bool(b) => kwargs.set_item(name, b),
            Property::Int(i) => kwargs.set_item(name, i),
            Property::Float(x) => kwargs.set_item(name, x),
            Property::Str(s) => kwargs.set_item(name, s),
        }
    }
}

/// Styling of a single plotted line.
#[derive(Clone)]
pub(crate) struct PlotOptions<'a> {
    pub(crate) fmt: &'a str,
    pub(crate) animated: bool,
    pub(crate) antialiased: bool,
    pub(crate) label: &'a str,
    pub(crate) linewidth: Option<f64>,
    pub(crate) color: Option<&'a str>,
    pub(crate) linestyle: Option<&'a str>,
    pub(crate) marker: Option<&'a str>,
    // Any other `Line2D` property; these win over the fields above.
    pub(crate) extra: Vec<(&'a str, Property<'a>)>,
}

impl<'a> PlotOptions<'a> {
    pub(crate) fn new() -> PlotOptions<'static> {
        PlotOptions { fmt: "", animated: false, antialiased: true,
                      label: "", linewidth: None, color: None,
                      linestyle: None, marker: None, extra: vec![] }
    }

    fn kwargs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let kwargs = PyDict::new_bound(py);
        if self.animated {
            kwargs.set_item("animated", true)?
        }
        kwargs.set_item("antialiased", self.antialiased)?;
        if !self.label.is_empty() {
            kwargs.set_item("label", self.label)?
        }
        if let Some(w) = self.linewidth {
            kwargs.set_item("linewidth", w)?
        }
        if let Some(c) = self.color {
            kwargs.set_item("color", c)?
        }
        if let Some(s) = self.linestyle {
            kwargs.set_item("linestyle", s)?
        }
        if let Some(m) = self.marker {
            kwargs.set_item("marker", m)?
        }
        for (name, value) in &self.extra {
            value.set_in(&kwargs, name)?
        }
        Ok(kwargs)
    }
}


/// One subplot of a figure.
#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject, // instance of matplotlib.axes.Axes
}

impl Axes {
    /// The underlying `matplotlib.axes.Axes` object.
    pub fn py_object(&self) -> &PyObject { &self.ax }

    pub fn xlim(&self) -> Result<(f64, f64), Error> {
        get!(self.ax, get_xlim)
    }

    pub fn ylim(&self) -> Result<(f64, f64), Error> {
        get!(self.ax, get_ylim)
    }

    pub fn title(&self) -> Result<String, Error> {
        get!(self.ax, get_title)
    }

    pub fn xlabel(&self) -> Result<String, Error> {
        get!(self.ax, get_xlabel)
    }

    pub fn ylabel(&self) -> Result<String, Error> {
        get!(self.ax, get_ylabel)
    }

    /// Scale of the x-axis: "linear", "log",...
    pub fn xscale(&self) -> Result<String, Error> {
        get!(self.ax, get_xscale)
    }

    pub fn yscale(&self) -> Result<String, Error> {
        get!(self.ax, get_yscale)
    }

    /// Font size, in points, of the subplot title.
    pub fn title_fontsize(&self) -> Result<f64, Error> {
        Python::with_gil(|py| {
            Ok(self.ax.bind(py).getattr(intern!(py, "title"))?
               .call_method0(intern!(py, "get_fontsize"))?.extract()?)
        })
    }

    pub fn xlabel_fontsize(&self) -> Result<f64, Error> {
        self.axis_label_fontsize(Axis::X)
    }

    pub fn ylabel_fontsize(&self) -> Result<f64, Error> {
        self.axis_label_fontsize(Axis::Y)
    }

    /// Font size of the first major tick label of the x-axis, `None`
    /// if the axis has no ticks.
    pub fn xtick_fontsize(&self) -> Result<Option<f64>, Error> {
        Python::with_gil(|py| {
            let ticks = Axis::X.of(self.ax.bind(py))?
                .call_method0(intern!(py, "get_major_ticks"))?;
            let Some(tick) = ticks.iter()?.next() else {
                return Ok(None)
            };
            let size = tick?.getattr(intern!(py, "label1"))?
                .call_method0(intern!(py, "get_fontsize"))?.extract()?;
            Ok(Some(size))
        })
    }

    fn axis_label_fontsize(&self, axis: Axis) -> Result<f64, Error> {
        Python::with_gil(|py| {
            Ok(axis.of(self.ax.bind(py))?
               .getattr(intern!(py, "label"))?
               .call_method0(intern!(py, "get_fontsize"))?.extract()?)
        })
    }

    pub fn facecolor(&self) -> Result<Rgba, Error> {
        let (r, g, b, a): (f64, f64, f64, f64) =
            get!(self.ax, get_facecolor)?;
        Ok(Rgba { r, g, b, a })
    }

    /// All lines drawn on these axes, including those not plotted
    /// through the manager.
    pub fn lines(&self) -> Result<Vec<Line2D>, Error> {
        Python::with_gil(|py| {
            let lines = self.ax.bind(py).call_method0(intern!(py, "get_lines"))?;
            let mut v = vec![];
            for l in lines.iter()? {
                v.push(Line2D { line: l?.unbind() });
            }
            Ok(v)
        })
    }

    pub(crate) fn set_xlim(&self, lo: f64, hi: f64) -> Result<(), Error> {
        meth!(self.ax, set_xlim, (lo, hi))?;
        Ok(())
    }

    pub(crate) fn set_ylim(&self, lo: f64, hi: f64) -> Result<(), Error> {
        meth!(self.ax, set_ylim, (lo, hi))?;
        Ok(())
    }

    /// Set the title, `pad` points above the axes (Matplotlib's
    /// default if `None`).
    pub(crate) fn set_title(
        &self, title: &str, font: &FontSettings, pad: Option<f64>
    ) -> Result<(), Error> {
        meth!(self.ax, set_title, py -> (title,), {
            let kwargs = font_kwargs(py, font)?;
            if let Some(pad) = pad {
                kwargs.set_item("pad", pad)?
            }
            Ok::<_, PyErr>(kwargs)
        })?;
        Ok(())
    }

    pub(crate) fn set_xlabel(
        &self, label: &str, font: &FontSettings) -> Result<(), Error> {
        meth!(self.ax, set_xlabel, py -> (label,), font_kwargs(py, font))?;
        Ok(())
    }

    pub(crate) fn set_ylabel(
        &self, label: &str, font: &FontSettings) -> Result<(), Error> {
        meth!(self.ax, set_ylabel, py -> (label,), font_kwargs(py, font))?;
        Ok(())
    }

    pub(crate) fn set_tick_labelsize(&self, size: i64) -> Result<(), Error> {
        meth!(self.ax, tick_params, py -> (),
              Ok::<_, PyErr>([("labelsize", size)].into_py_dict_bound(py)))?;
        Ok(())
    }

    pub(crate) fn set_facecolor(&self, c: Rgba) -> Result<(), Error> {
        meth!(self.ax, set_facecolor, (c.to_tuple(),))?;
        Ok(())
    }

    /// Cycle colours and line styles together over successive lines.
    pub(crate) fn set_prop_cycle(
        &self, cycle: &[(String, String)]) -> Result<(), Error> {
        let (colors, styles): (Vec<&str>, Vec<&str>) = cycle.iter()
            .map(|(c, s)| (c.as_str(), s.as_str()))
            .unzip();
        meth!(self.ax, set_prop_cycle, py -> (), {
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("color", colors)?;
            kwargs.set_item("linestyle", styles)?;
            Ok::<_, PyErr>(kwargs)
        })?;
        Ok(())
    }

    pub(crate) fn legend(&self) -> Result<(), Error> {
        meth!(self.ax, legend, ())?;
        Ok(())
    }

    pub(crate) fn sharex(&self, other: &Axes) -> Result<(), Error> {
        meth!(self.ax, sharex, py -> (other.ax.clone_ref(py),))?;
        Ok(())
    }

    pub(crate) fn sharey(&self, other: &Axes) -> Result<(), Error> {
        meth!(self.ax, sharey, py -> (other.ax.clone_ref(py),))?;
        Ok(())
    }

    /// Draw `y` versus `x` (or versus its indices) and return the line.
    pub(crate) fn plot<D>(
        &self, scale: Scale, x: Option<&D>, y: &D, options: &PlotOptions<'_>
    ) -> Result<Line2D, Error>
    where D: Data + ?Sized {
        Python::with_gil(|py| {
            let mut args: Vec<PyObject> = Vec::with_capacity(3);
            if let Some(x) = x {
                args.push(x.to_numpy(py).into_any().unbind());
            }
            args.push(y.to_numpy(py).into_any().unbind());
            if !options.fmt.is_empty() {
                args.push(options.fmt.into_py(py));
            }
            let lines = self.ax.bind(py).call_method(
                scale.method(), PyTuple::new_bound(py, args),
                Some(&options.kwargs(py)?))?;
            Ok(Line2D { line: lines.get_item(0)?.unbind() })
        })
    }
}


#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of<'py>(self, ax: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>> {
        let py = ax.py();
        match self {
            Axis::X => ax.call_method0(intern!(py, "get_xaxis")),
            Axis::Y => ax.call_method0(intern!(py, "get_yaxis")),
        }
    }
}


/// The top level container for all the plot elements.
#[derive(Debug)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
}

impl Figure {
    /// Create a figure registered with pyplot, so that it gets a window
    /// on interactive backends.
    pub(crate) fn new() -> Result<Figure, Error> {
        let pyplot = pymod!(PYPLOT)?;
        Python::with_gil(|py| {
            let fig = pyplot.bind(py).call_method0(intern!(py, "figure"))?;
            Ok(Figure { fig: fig.unbind() })
        })
    }

    /// The underlying `matplotlib.figure.Figure` object.
    pub fn py_object(&self) -> &PyObject { &self.fig }

    /// Resolution in dots per inch, also used when saving without an
    /// explicit dpi.
    pub fn dpi(&self) -> Result<f64, Error> {
        get!(self.fig, get_dpi)
    }

    /// Add the subplot at 1-based `index` of a `rows` × `cols` layout.
    pub(crate) fn add_subplot(
        &self, rows: usize, cols: usize, index: usize) -> Result<Axes, Error> {
        let ax = meth!(self.fig, add_subplot, (rows, cols, index))?;
        Ok(Axes { ax })
    }

    /// Size in inches.
    pub fn size_inches(&self) -> Result<(f64, f64), Error> {
        let size = Python::with_gil(|py| -> Result<PyObject, Error> {
            Ok(self.fig.bind(py)
               .call_method0(intern!(py, "get_size_inches"))?.unbind())
        })?;
        match float_vec(size)?[..] {
            [w, h] => Ok((w, h)),
            ref s => Err(PyValueError::new_err(format!(
                "figure size with {} components", s.len())).into()),
        }
    }

    pub(crate) fn set_size_inches(&self, w: f64, h: f64) -> Result<(), Error> {
        meth!(self.fig, set_size_inches, (w, h))?;
        Ok(())
    }

    pub(crate) fn suptitle(
        &self, title: &str, font: &FontSettings) -> Result<(), Error> {
        meth!(self.fig, suptitle, py -> (title,), font_kwargs(py, font))?;
        Ok(())
    }

    /// Text of the figure title, `None` if none (or an empty one) was
    /// set.
    pub fn suptitle_text(&self) -> Result<Option<String>, Error> {
        Python::with_gil(|py| {
            let fig = self.fig.bind(py);
            let text: String =
                if fig.hasattr(intern!(py, "get_suptitle"))? {
                    fig.call_method0(intern!(py, "get_suptitle"))?.extract()?
                } else {
                    // Matplotlib < 3.8: the title is the last figure text.
                    let texts = fig.getattr(intern!(py, "texts"))?;
                    let mut last = String::new();
                    for t in texts.iter()? {
                        last = t?.call_method0(intern!(py, "get_text"))?
                            .extract()?;
                    }
                    last
                };
            Ok(if text.is_empty() { None } else { Some(text) })
        })
    }

    /// Ask the canvas to repaint when the GUI is next idle.
    pub(crate) fn draw_idle(&self) -> Result<(), Error> {
        Python::with_gil(|py| {
            self.fig.bind(py).getattr(intern!(py, "canvas"))?
                .call_method0(intern!(py, "draw_idle"))?;
            Ok(())
        })
    }

    /// Raise `closed` when the figure window is closed.
    pub(crate) fn on_close(&self, closed: Arc<AtomicBool>) -> Result<(), Error> {
        Python::with_gil(|py| {
            let callback = PyCFunction::new_closure_bound(
                py, None, None,
                move |_args: &Bound<'_, PyTuple>,
                      _kwargs: Option<&Bound<'_, PyDict>>| {
                    closed.store(true, Ordering::SeqCst);
                })?;
            self.fig.bind(py).getattr(intern!(py, "canvas"))?
                .call_method1(intern!(py, "mpl_connect"),
                              ("close_event", callback))?;
            Ok(())
        })
    }

    pub(crate) fn savefig(
        &self, path: &Path, dpi: Option<f64>) -> Result<(), Error> {
        Python::with_gil(|py| {
            let kwargs = PyDict::new_bound(py);
            if let Some(dpi) = dpi {
                kwargs.set_item("dpi", dpi)?
            }
            self.fig.bind(py).call_method(
                intern!(py, "savefig"), (path,), Some(&kwargs)
            ).map_err(|e| {
                if e.is_instance_of::<PyFileNotFoundError>(py) {
                    Error::FileNotFoundError
                } else if e.is_instance_of::<PyPermissionError>(py) {
                    Error::PermissionError
                } else {
                    Error::Python(e)
                }
            })?;
            Ok(())
        })
    }

    /// Remove the figure from pyplot and release its window.
    pub(crate) fn close(&self) -> Result<(), Error> {
        let pyplot = pymod!(PYPLOT)?;
        Python::with_gil(|py| {
            pyplot.bind(py).call_method1(
                intern!(py, "close"), (self.fig.clone_ref(py),))?;
            Ok(())
        })
    }
}


/// A line drawn on some [`Axes`].
#[derive(Debug, Clone)]
pub struct Line2D {
    line: PyObject, // instance of matplotlib.lines.Line2D
}

impl Line2D {
    fn set_kw<I>(&self, kwargs: I) -> Result<&Self, Error>
    where I: IntoPyDict {
        meth!(self.line, set, py -> (),
              Ok::<_, PyErr>(kwargs.into_py_dict_bound(py)))?;
        Ok(self)
    }

    /// The underlying `matplotlib.lines.Line2D` object.
    pub fn py_object(&self) -> &PyObject { &self.line }

    /// Set any property of the line, e.g. `set("alpha", 0.5)`.
    pub fn set<'v>(&self, name: &str, value: impl Into<Property<'v>>)
                   -> Result<&Self, Error> {
        meth!(self.line, set, py -> (), {
            let kwargs = PyDict::new_bound(py);
            value.into().set_in(&kwargs, name)?;
            Ok::<_, PyErr>(kwargs)
        })?;
        Ok(self)
    }

    /// Value of the property `name`, read with its `get_<name>` method.
    pub fn get<T>(&self, name: &str) -> Result<T, Error>
    where T: for<'py> FromPyObject<'py> {
        Python::with_gil(|py| {
            Ok(self.line.bind(py).call_method0(format!("get_{name}").as_str())?
               .extract()?)
        })
    }

    pub fn xdata(&self) -> Result<Vec<f64>, Error> {
        float_vec(meth!(self.line, get_xdata, ())?)
    }

    pub fn ydata(&self) -> Result<Vec<f64>, Error> {
        float_vec(meth!(self.line, get_ydata, ())?)
    }

    pub fn label(&self) -> Result<String, Error> {
        get!(self.line, get_label)
    }

    /// Line style in Matplotlib's short form ("-", "--", ":",...).
    pub fn linestyle(&self) -> Result<String, Error> {
        get!(self.line, get_linestyle)
    }

    pub fn linewidth(&self) -> Result<f64, Error> {
        get!(self.line, get_linewidth)
    }

    /// Set the label shown by the legend.  Call
    /// [`PlotManager::legend`](crate::PlotManager::legend) to refresh it.
    pub fn set_label(&self, label: &str) -> Result<&Self, Error> {
        self.set_kw([("label", label)])
    }

    pub fn set_color(&self, color: &str) -> Result<&Self, Error> {
        self.set_kw([("color", color)])
    }

    pub fn set_linestyle(&self, style: &str) -> Result<&Self, Error> {
        self.set_kw([("linestyle", style)])
    }

    pub fn set_linewidth(&self, w: f64) -> Result<&Self, Error> {
        self.set_kw([("linewidth", w)])
    }
}
