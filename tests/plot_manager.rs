//! These tests drive Matplotlib with the headless "Agg" backend.  They
//! are skipped when Matplotlib cannot be imported.

use std::{io::Write, path::Path, sync::OnceLock};
use ndarray::Array1;
use pyo3::prelude::*;
use tempfile::{NamedTempFile, TempDir};
use plot_manager::{use_backend, Error, Link, PlotConfig, PlotManager};

const CONFIG: &str = "\
[text]
xlabels.font = DejaVu Sans
xlabels.fontsize = 12
title.font = DejaVu Sans
title.fontsize = 14

[lines]
color_sequence = blue, red, green
linestyle_sequence = solid, dashed, dotted

[axes]
background_color = 1.0, 1.0, 1.0
";

fn config_file() -> NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    f.write_all(CONFIG.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

/// Select the backend once; switching backends closes every figure.
fn matplotlib_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| match use_backend("Agg") {
        Ok(()) => true,
        Err(Error::NoMatplotlib) => {
            eprintln!("matplotlib not available, skipping");
            false
        }
        Err(e) => panic!("cannot select the Agg backend: {e}"),
    })
}

fn plot_manager() -> Option<PlotManager> {
    if !matplotlib_available() {
        return None;
    }
    let file = config_file();
    let config = PlotConfig::from_file(file.path()).unwrap();
    Some(PlotManager::with_config(2, 2, config).unwrap())
}

macro_rules! manager { () => {
    match plot_manager() {
        Some(pm) => pm,
        None => return Ok(()),
    }
}}

fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    (0 .. n).map(|i| a + (b - a) * i as f64 / (n - 1) as f64).collect()
}

fn assert_close((a0, a1): (f64, f64), (b0, b1): (f64, f64)) {
    assert!((a0 - b0).abs() < 1e-9 && (a1 - b1).abs() < 1e-9,
            "({a0}, {a1}) != ({b0}, {b1})");
}

/// Width and height of a PNG image, read from its header.
fn png_size(path: &Path) -> (u32, u32) {
    let bytes = std::fs::read(path).unwrap();
    let be = |i: usize| u32::from_be_bytes(bytes[i .. i + 4].try_into().unwrap());
    (be(16), be(20))
}

#[test]
fn initialization() -> Result<(), Error> {
    let mut pm = manager!();
    assert_eq!((pm.rows(), pm.cols()), (2, 2));
    assert_eq!(pm.active_subplot(), (0, 0));
    assert_eq!(pm.num_lines(), 0);
    assert!(!pm.is_window_closed());
    assert_eq!(pm.axes(1, 1)?.xlabel()?, "X Label");
    assert_eq!(pm.axes(1, 1)?.ylabel()?, "Y Label");
    assert_eq!(pm.axes(0, 1)?.facecolor()?.to_tuple(), (1., 1., 1., 1.));
    assert!(matches!(pm.axes(2, 0), Err(Error::InvalidSubplot { .. })));
    pm.close()
}

#[test]
fn active_subplot() -> Result<(), Error> {
    let mut pm = manager!();
    pm.set_active_subplot(1, 1)?;
    assert_eq!(pm.active_subplot(), (1, 1));
    assert!(matches!(pm.set_active_subplot(2, 2),
                     Err(Error::InvalidSubplot { row: 2, col: 2 })));
    assert_eq!(pm.active_subplot(), (1, 1));
    pm.close()
}

#[test]
fn empty_grid() -> Result<(), Error> {
    if !matplotlib_available() {
        return Ok(());
    }
    assert!(matches!(PlotManager::new(0, 2),
                     Err(Error::EmptyGrid { rows: 0, cols: 2 })));
    Ok(())
}

#[test]
fn plotting() -> Result<(), Error> {
    let mut pm = manager!();
    let x = linspace(0., 10., 100);
    let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
    pm.xy(&x, &y).legend("sin(x)").plot()?;
    assert_eq!(pm.num_lines(), 1);
    let line = pm.line(1)?;
    assert_eq!(line.xdata()?, x);
    assert_eq!(line.ydata()?, y);
    assert_eq!(line.label()?, "sin(x)");
    pm.close()
}

#[test]
fn data_outlives_rust_buffers() -> Result<(), Error> {
    let mut pm = manager!();
    {
        let y = vec![3., 1., 2.];
        pm.y(&y).plot()?;
    }
    let x = Array1::linspace(1., 2., 3);
    pm.xy(&x, &x.mapv(|v| 2. * v)).plot()?;
    assert_eq!(pm.line(1)?.xdata()?, [0., 1., 2.]);
    assert_eq!(pm.line(1)?.ydata()?, [3., 1., 2.]);
    assert_eq!(pm.line(2)?.ydata()?, [2., 3., 4.]);
    pm.close()
}

#[test]
fn length_mismatch() -> Result<(), Error> {
    let mut pm = manager!();
    let r = pm.xy(&[1., 2., 3.][..], &[1., 2.][..]).plot();
    assert!(matches!(r, Err(Error::LengthMismatch { x: 3, y: 2 })));
    assert_eq!(pm.num_lines(), 0);
    pm.close()
}

#[test]
fn log_plots() -> Result<(), Error> {
    let mut pm = manager!();
    let x: Vec<f64> = (0 .. 100).map(|i| 10f64.powf(i as f64 / 50.)).collect();
    let y: Vec<f64> = x.iter().map(|x| x * x).collect();

    pm.set_active_subplot(0, 0)?;
    pm.xy(&x, &y).legend("semilogx").semilogx()?;
    assert_eq!(pm.num_lines(), 1);
    assert_eq!(pm.active_axes().xscale()?, "log");
    assert_eq!(pm.active_axes().yscale()?, "linear");

    pm.set_active_subplot(0, 1)?;
    pm.xy(&x, &y).legend("semilogy").semilogy()?;
    assert_eq!(pm.num_lines(), 1);
    assert_eq!(pm.active_axes().yscale()?, "log");

    pm.set_active_subplot(1, 0)?;
    pm.xy_from(x.iter().zip(&y).map(|(&x, &y)| (x, y)))
        .legend("loglog").loglog()?;
    assert_eq!(pm.num_lines(), 1);
    assert_eq!(pm.active_axes().xscale()?, "log");
    assert_eq!(pm.active_axes().yscale()?, "log");

    pm.set_active_subplot(1, 1)?;
    assert_eq!(pm.num_lines(), 0);
    pm.close()
}

#[test]
fn zoom_functions() -> Result<(), Error> {
    let mut pm = manager!();
    let x = linspace(0., 10., 100);
    let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
    pm.xy(&x, &y).plot()?;

    pm.zoom_x(2., 8., false)?;
    assert_close(pm.axes(0, 0)?.xlim()?, (2., 8.));
    pm.zoom_y(Some(-0.5), Some(0.5))?;
    assert_close(pm.axes(0, 0)?.ylim()?, (-0.5, 0.5));
    pm.close()
}

#[test]
fn autozoom_follows_visible_points() -> Result<(), Error> {
    let mut pm = manager!();
    let x: Vec<f64> = (0 ..= 10).map(f64::from).collect();
    pm.xy(&x, &x).plot()?;
    let neg: Vec<f64> = x.iter().map(|x| -x / 10.).collect();
    pm.xy(&x, &neg).plot()?;

    pm.zoom_x(2., 5., true)?;
    assert_close(pm.active_axes().xlim()?, (2., 5.));
    assert_close(pm.active_axes().ylim()?, (-0.5, 5.));

    // Nothing visible: the y-axis is left alone.
    pm.zoom_x(20., 30., true)?;
    assert_close(pm.active_axes().ylim()?, (-0.5, 5.));
    pm.close()
}

#[test]
fn zoom_y_fills_missing_bounds() -> Result<(), Error> {
    let mut pm = manager!();
    pm.xy(&[0., 1., 2.], &[-2., 7., 3.]).plot()?;
    pm.zoom_y(None, None)?;
    assert_close(pm.active_axes().ylim()?, (-2., 7.));
    pm.zoom_y(Some(-10.), None)?;
    assert_close(pm.active_axes().ylim()?, (-10., 7.));

    // No lines, no change.
    pm.set_active_subplot(1, 1)?;
    let before = pm.active_axes().ylim()?;
    pm.zoom_y(None, Some(3.))?;
    assert_close(pm.active_axes().ylim()?, before);
    pm.close()
}

#[test]
fn linked_axes() -> Result<(), Error> {
    let mut pm = manager!();
    pm.link_axes(Link::X)?;
    pm.zoom_x(2., 8., false)?;
    assert_close(pm.axes(1, 1)?.xlim()?, (2., 8.));
    pm.close()
}

#[test]
fn linked_y_axes() -> Result<(), Error> {
    let mut pm = manager!();
    pm.link_axes(Link::Y)?;
    let xlim = pm.axes(1, 0)?.xlim()?;
    pm.zoom_y(Some(-3.), Some(3.))?;
    pm.zoom_x(5., 6., false)?;
    assert_close(pm.axes(1, 0)?.ylim()?, (-3., 3.));
    assert_close(pm.axes(1, 0)?.xlim()?, xlim);
    pm.close()
}

#[test]
fn linked_x_and_y_axes() -> Result<(), Error> {
    let mut pm = manager!();
    pm.link_axes(Link::XY)?;
    pm.set_active_subplot(1, 1)?;
    pm.zoom_x(2., 8., false)?;
    pm.zoom_y(Some(-1.), Some(1.))?;
    for (r, c) in [(0, 0), (0, 1), (1, 0)] {
        assert_close(pm.axes(r, c)?.xlim()?, (2., 8.));
        assert_close(pm.axes(r, c)?.ylim()?, (-1., 1.));
    }
    pm.close()
}

#[test]
fn label_fonts_follow_config() -> Result<(), Error> {
    let mut pm = manager!();
    let axes = pm.axes(1, 0)?;
    assert_eq!(axes.xlabel_fontsize()?, 12.);
    assert_eq!(axes.ylabel_fontsize()?, 12.);
    if let Some(size) = axes.xtick_fontsize()? {
        assert_eq!(size, 12.);
    }
    pm.set_subplot_title("Title")?;
    assert_eq!(pm.active_axes().title_fontsize()?, 14.);
    pm.close()
}

#[test]
fn titles() -> Result<(), Error> {
    let mut pm = manager!();
    assert_eq!(pm.figure().suptitle_text()?, None);
    pm.set_subplot_title("Subplot Title")?;
    assert_eq!(pm.axes(0, 0)?.title()?, "Subplot Title");
    pm.set_figure_title("Figure Title")?;
    assert_eq!(pm.figure().suptitle_text()?.as_deref(), Some("Figure Title"));
    pm.close()
}

#[test]
fn subplot_title_pad() -> Result<(), Error> {
    let mut pm = manager!();
    pm.set_subplot_title_with_pad("Padded", 20.)?;
    assert_eq!(pm.active_axes().title()?, "Padded");
    let offset: Vec<Vec<f64>> = Python::with_gil(|py| -> PyResult<_> {
        pm.active_axes().py_object().bind(py)
            .getattr("titleOffsetTrans")?
            .call_method0("get_matrix")?
            .call_method0("tolist")?
            .extract()
    })?;
    let dpi = pm.figure().dpi()?;
    assert!((offset[1][2] - 20. / 72. * dpi).abs() < 1e-9);
    pm.close()
}

#[test]
fn figure_size() -> Result<(), Error> {
    let mut pm = manager!();
    pm.set_figure_size(8., 6.)?;
    assert_close(pm.figure_size()?, (8., 6.));
    pm.close()
}

#[test]
fn line_style_cycle() -> Result<(), Error> {
    let mut pm = manager!();
    let x = [0., 1.];
    pm.xy(&x, &x).plot()?;
    pm.xy(&x, &x).plot()?;
    assert_eq!(pm.line(1)?.linestyle()?, "-");
    assert_eq!(pm.line(2)?.linestyle()?, "--");
    pm.close()
}

#[test]
fn save_figure() -> Result<(), Error> {
    let mut pm = manager!();
    let dir = TempDir::new().unwrap();
    let x = linspace(0., 10., 100);
    let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
    pm.xy(&x, &y).plot()?;

    let path = dir.path().join("test_plot.png");
    pm.save().to_file(&path)?;
    assert!(path.exists());

    // The output size only applies while saving.
    pm.set_figure_size(4., 3.)?;
    pm.set_output_size(8., 6.);
    let path = dir.path().join("big.PNG");
    pm.save().dpi(50.).filetypes([".png"]).to_file(&path)?;
    assert!(path.exists());
    assert_close(pm.figure_size()?, (4., 3.));
    pm.close()
}

#[test]
fn non_positive_dpi_uses_figure_dpi() -> Result<(), Error> {
    let mut pm = manager!();
    let dir = TempDir::new().unwrap();
    pm.set_figure_size(4., 3.)?;
    let dpi = pm.figure().dpi()?;
    let expected = ((4. * dpi).round() as u32, (3. * dpi).round() as u32);
    for (i, d) in [0., -72.].into_iter().enumerate() {
        let path = dir.path().join(format!("default{i}.png"));
        pm.save().dpi(d).to_file(&path)?;
        assert_eq!(png_size(&path), expected);
    }
    let path = dir.path().join("dpi50.png");
    pm.save().dpi(50.).to_file(&path)?;
    assert_eq!(png_size(&path), (200, 150));
    pm.close()
}

#[test]
fn save_errors() -> Result<(), Error> {
    let mut pm = manager!();
    let dir = TempDir::new().unwrap();
    let r = pm.save().filetypes(["png"]).to_file(dir.path().join("a.jpg"));
    assert!(matches!(r, Err(Error::UnsupportedFileType { .. })));

    let r = pm.save().to_file(dir.path().join("missing").join("a.png"));
    assert!(matches!(r, Err(Error::FileNotFoundError)));

    pm.close()?;
    assert!(pm.is_window_closed());
    let r = pm.save().to_file(dir.path().join("closed.png"));
    assert!(matches!(r, Err(Error::WindowClosed)));
    Ok(())
}

#[test]
fn close_event_marks_window_closed() -> Result<(), Error> {
    let mut pm = manager!();
    Python::with_gil(|py| -> PyResult<()> {
        let canvas = pm.figure().py_object().bind(py).getattr("canvas")?;
        py.import_bound("matplotlib.backend_bases")?
            .getattr("CloseEvent")?
            .call1(("close_event", canvas))?
            .call_method0("_process")?;
        Ok(())
    })?;
    assert!(pm.is_window_closed());
    let dir = TempDir::new().unwrap();
    let r = pm.save().to_file(dir.path().join("closed.png"));
    assert!(matches!(r, Err(Error::WindowClosed)));
    pm.close()
}

#[test]
fn line_properties() -> Result<(), Error> {
    let mut pm = manager!();
    let x = [0., 1., 2.];
    pm.xy(&x, &x).kw("alpha", 0.5).kw("zorder", 3).kw("drawstyle", "steps")
        .plot()?;
    let line = pm.line(1)?;
    assert_eq!(line.get::<f64>("alpha")?, 0.5);
    assert_eq!(line.get::<f64>("zorder")?, 3.);
    assert_eq!(line.get::<String>("drawstyle")?, "steps");
    line.set("markersize", 7.)?.set("visible", false)?;
    assert_eq!(line.get::<f64>("markersize")?, 7.);
    assert!(!line.get::<bool>("visible")?);

    let r = pm.xy(&x, &x).kw("no_such_property", 1).plot();
    assert!(matches!(r, Err(Error::Python(_))));
    assert_eq!(pm.num_lines(), 1);
    pm.close()
}

#[test]
fn line_tracked_when_redraw_fails() -> Result<(), Error> {
    let mut pm = manager!();
    let x = [0., 1.];
    // Drawing the legend fails to parse this mathtext label.
    let _ = pm.xy(&x, &x).legend(r"$\frac{$").plot();
    assert_eq!(pm.num_lines(), 1);
    assert_eq!(pm.active_axes().lines()?.len(), 1);
    pm.close()
}

#[test]
fn line_management() -> Result<(), Error> {
    let mut pm = manager!();
    let x = linspace(0., 10., 100);
    let sin: Vec<f64> = x.iter().map(|x| x.sin()).collect();
    let cos: Vec<f64> = x.iter().map(|x| x.cos()).collect();
    pm.xy(&x, &sin).legend("sin").plot()?;
    pm.xy(&x, &cos).legend("cos").plot()?;
    assert_eq!(pm.num_lines(), 2);
    assert!(matches!(pm.line(3),
                     Err(Error::LineOutOfRange { requested: 3, available: 2 })));
    assert!(pm.line(0).is_err());

    pm.line(2)?.set_label("cosine")?.set_linewidth(3.)?;
    pm.legend()?;
    assert_eq!(pm.line(2)?.label()?, "cosine");
    assert_eq!(pm.line(2)?.linewidth()?, 3.);
    pm.close()
}
