//! A subplot-grid manager on top of the [Matplotlib][] Python
//! visualization library.
//!
//! Usage
//! -----
//!
//! A [`PlotManager`] owns one figure split into a grid of subplots.
//! Plots, zooms and titles go to the *active* subplot, selected with
//! [`PlotManager::set_active_subplot`].  Fonts, line colours and
//! styles, and the axes background come from an INI file, see
//! [`config`].
//!
//! ```no_run
//! use plot_manager::{PlotConfig, PlotManager};
//!
//! let config = PlotConfig::from_file("config/plot_defaults.ini")?;
//! let mut pm = PlotManager::with_config(2, 1, config)?;
//! let x: Vec<f64> = (0 .. 100).map(|i| i as f64 / 10.).collect();
//! let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
//! pm.xy(&x, &y).legend("sin(x)").plot()?;
//! pm.zoom_x(2., 8., true)?;
//! pm.set_active_subplot(1, 0)?;
//! pm.xy(&x, &y).semilogy()?;
//! pm.set_figure_title("Demo")?;
//! pm.save().to_file("target/demo.png")?;
//! # Ok::<(), plot_manager::Error>(())
//! ```
//!
//! All drawing, scaling and file encoding is done by Matplotlib, which
//! must be installed for the Python interpreter linked by [pyo3][].
//!
//! [Matplotlib]: https://matplotlib.org/
//! [pyo3]: https://pyo3.rs/

pub mod bounds;
pub mod config;
mod error;
pub mod grid;
pub mod manager;
pub mod mpl;

pub use config::{FontSettings, PlotConfig, Rgba};
pub use error::Error;
pub use manager::{
    is_supported_backend, Link, PlotManager, Savefig, XY, XYFrom,
    DEFAULT_DPI, SUPPORTED_BACKENDS,
};
pub use mpl::{
    backend, show, use_backend, Axes, Data, Figure, Line2D, Property, Scale,
};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
