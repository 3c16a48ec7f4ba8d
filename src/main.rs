//! Render the demo figure: four subplots, log scales, linked x-axes.

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ndarray::Array1;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use plot_manager::{self as pm, Link, PlotConfig, PlotManager};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LinkArg {
    X,
    Y,
    Xy,
}

impl From<LinkArg> for Link {
    fn from(l: LinkArg) -> Link {
        match l {
            LinkArg::X => Link::X,
            LinkArg::Y => Link::Y,
            LinkArg::Xy => Link::XY,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "plot-manager")]
#[command(about = "Render a demo figure with plot-manager", long_about = None)]
struct Args {
    /// INI file layered over the default styling
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to save the figure; the format follows the extension
    #[arg(short, long, default_value = "demo_plot.png")]
    output: PathBuf,

    #[arg(long, default_value_t = pm::DEFAULT_DPI)]
    dpi: f64,

    /// Matplotlib backend to select first, e.g. Agg when headless
    #[arg(long)]
    backend: Option<String>,

    /// Axes shared between the subplots
    #[arg(long, value_enum, default_value = "x")]
    link: LinkArg,

    /// Open a window and wait for it to be closed
    #[arg(long)]
    show: bool,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn init_logging(log: Option<&PathBuf>) -> Result<()> {
    let builder = FmtSubscriber::builder().with_env_filter(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")));
    match log {
        Some(path) => {
            let file = std::fs::File::create(path).with_context(|| {
                format!("cannot create log file {}", path.display())
            })?;
            let subscriber = builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_ref())?;

    if let Some(backend) = &args.backend {
        pm::use_backend(backend)?;
    }
    let config = match &args.config {
        Some(path) => PlotConfig::from_file(path)?,
        None => PlotConfig::default(),
    };

    let x = Array1::linspace(0., 10., 100);
    let y1 = x.mapv(f64::sin);
    let y2 = x.mapv(f64::cos);
    let y3 = x.mapv(|x| (-x / 5.).exp() * x.sin());
    let y4 = x.mapv(|x| x * x / 50.);

    let mut plots = PlotManager::with_config(2, 2, config)?;

    plots.set_active_subplot(0, 0)?;
    plots.xy(&x, &y1).legend("sin(x)").color("blue").plot()?;
    plots.xy(&x, &y2).legend("cos(x)").color("red").plot()?;
    plots.set_subplot_title("Trigonometric Functions")?;

    plots.set_active_subplot(0, 1)?;
    plots.xy(&x, &y4).legend("x^2").color("green").semilogy()?;
    plots.set_subplot_title("Quadratic Function")?;

    plots.set_active_subplot(1, 0)?;
    plots.xy(&x, &y3).legend("Damped Sine").color("purple").plot()?;
    plots.set_subplot_title("Damped Sine Wave")?;

    plots.link_axes(args.link.into())?;
    plots.set_figure_title("Demo Plot")?;
    plots.set_figure_size(12., 8.)?;

    plots.save().dpi(args.dpi).to_file(&args.output)?;
    tracing::info!(output = %args.output.display(), "demo figure written");

    if args.show {
        pm::show()?;
    }
    Ok(())
}
