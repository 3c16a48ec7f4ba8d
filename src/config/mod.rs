//! Styling read from INI files.
//!
//! A [`PlotConfig`] always starts from the defaults shipped in
//! `config/plot_defaults.ini`; user files only need the keys they
//! change.  The recognised keys are:
//!
//! ```ini
//! [text]
//! xlabels.font = DejaVu Sans
//! xlabels.fontsize = 10
//! title.font = DejaVu Sans
//! title.fontsize = 12
//!
//! [lines]
//! color_sequence = blue, red, green
//! linestyle_sequence = solid, dashed
//!
//! [axes]
//! background_color = 1.0, 1.0, 1.0
//! ```

pub mod ini;

use std::{path::Path, str::FromStr};
use tracing::debug;
use crate::Error;
pub use ini::Ini;

const DEFAULTS: &str = include_str!("../../config/plot_defaults.ini");

/// Font used by a family of text elements (`xlabels`, `title`,...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSettings {
    pub font: String,
    pub fontsize: i64,
}

/// A colour with components in \[0, 1\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn to_tuple(self) -> (f64, f64, f64, f64) {
        (self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone)]
pub struct PlotConfig {
    ini: Ini,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let ini = Ini::parse(DEFAULTS, "plot_defaults.ini")
            .expect("the embedded default configuration is valid");
        PlotConfig { ini }
    }
}

impl FromStr for PlotConfig {
    type Err = Error;

    /// Layer the INI text `s` over the defaults.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut config = PlotConfig::default();
        config.ini.read_str(s, "<string>")?;
        Ok(config)
    }
}

impl PlotConfig {
    /// Layer the file at `path` over the defaults.  Unlike Python's
    /// `ConfigParser.read`, a missing file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut config = PlotConfig::default();
        config.ini.read_file(path)?;
        debug!(path = %path.display(), "loaded plot configuration");
        Ok(config)
    }

    /// Access the underlying key/value data.
    pub fn ini(&self) -> &Ini {
        &self.ini
    }

    fn list(&self, section: &str, option: &str) -> Result<Vec<String>, Error> {
        let raw = self.ini.get(section, option)?;
        let items: Vec<String> = raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if items.is_empty() {
            return Err(Error::invalid_value(
                section, option, raw, "a non-empty comma separated list"));
        }
        Ok(items)
    }

    /// Colours given to successive lines of a subplot.
    pub fn color_sequence(&self) -> Result<Vec<String>, Error> {
        self.list("lines", "color_sequence")
    }

    /// Line styles given to successive lines of a subplot.
    pub fn linestyle_sequence(&self) -> Result<Vec<String>, Error> {
        self.list("lines", "linestyle_sequence")
    }

    /// Pair colours and line styles.  Both sequences are repeated up
    /// to the least common multiple of their lengths so that they can
    /// be cycled together.
    pub fn line_cycle(&self) -> Result<Vec<(String, String)>, Error> {
        let colors = self.color_sequence()?;
        let styles = self.linestyle_sequence()?;
        let n = lcm(colors.len(), styles.len());
        Ok((0 .. n)
           .map(|i| (colors[i % colors.len()].clone(),
                     styles[i % styles.len()].clone()))
           .collect())
    }

    /// Axes background, 3 (RGB) or 4 (RGBA) comma separated floats.
    pub fn background_color(&self) -> Result<Rgba, Error> {
        const EXPECTED: &str = "3 or 4 comma separated numbers in [0, 1]";
        let raw = self.ini.get("axes", "background_color")?;
        let invalid = || {
            Error::invalid_value("axes", "background_color", raw, EXPECTED)
        };
        let c = raw.split(',')
            .map(|x| x.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        if !c.iter().all(|x| (0. ..= 1.).contains(x)) {
            return Err(invalid());
        }
        match c[..] {
            [r, g, b] => Ok(Rgba { r, g, b, a: 1. }),
            [r, g, b, a] => Ok(Rgba { r, g, b, a }),
            _ => Err(invalid()),
        }
    }

    /// Font settings of `element`, read from `[text] <element>.font`
    /// and `[text] <element>.fontsize`.
    pub fn font_settings(&self, element: &str) -> Result<FontSettings, Error> {
        let font = self.ini.get("text", &format!("{element}.font"))?;
        let size_key = format!("{element}.fontsize");
        let fontsize = self.ini.get_int("text", &size_key)?;
        if fontsize <= 0 {
            return Err(Error::invalid_value(
                "text", &size_key, &fontsize.to_string(),
                "a positive integer"));
        }
        Ok(FontSettings { font: font.to_string(), fontsize })
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}
