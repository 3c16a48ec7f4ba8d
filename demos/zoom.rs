//! Log-scale plots and zooming, saved to `target/zoom_demo.svg`.

use std::error::Error;
use plot_manager::{self as pm, PlotManager};

fn main() -> Result<(), Box<dyn Error>> {
    pm::use_backend("Agg")?;
    let mut plots = PlotManager::new(2, 2)?;

    let x: Vec<_> = (0 ..= 200).map(|i| 10f64.powf(i as f64 / 100.)).collect();
    let y: Vec<_> = x.iter().map(|x| x * x).collect();

    plots.xy(&x, &y).legend("semilogx").semilogx()?;
    plots.set_active_subplot(0, 1)?;
    plots.xy(&x, &y).legend("semilogy").semilogy()?;
    plots.set_active_subplot(1, 0)?;
    plots.xy(&x, &y).legend("loglog").loglog()?;

    // Zoom on 2 ≤ x ≤ 5 and let y follow the visible part of the curve.
    plots.set_active_subplot(1, 1)?;
    let t: Vec<_> = (0 .. 500).map(|i| i as f64 / 50.).collect();
    plots.xy_from(t.iter().map(|&t| (t, t.sin() * t))).fmt("r-").plot()?;
    plots.zoom_x(2., 5., true)?;
    let (lo, hi) = plots.active_axes().ylim()?;
    println!("y range on [2, 5]: [{lo:.3}, {hi:.3}]");

    plots.set_output_size(10., 10.);
    plots.save().filetypes(["svg", "pdf"]).to_file("target/zoom_demo.svg")?;
    Ok(())
}
