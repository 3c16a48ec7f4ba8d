//! Reader for INI files in the dialect of Python's `configparser`.
//!
//! Several sources may be read into the same [`Ini`]; values read
//! later override earlier ones.  Inside a single source, a section or
//! an option given twice is an error.
//!
//! A value continues on the following lines indented deeper than its
//! option name.  Blank lines between continuation lines are kept in
//! the value, trailing ones are dropped.  There is no `%`
//! interpolation and no inline comment.

use std::{
    collections::HashSet,
    fs,
    path::Path,
};
use crate::Error;

/// Name of the section whose options are visible from every section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Clone)]
struct Section {
    name: String,
    options: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Section { name: name.to_string(), options: vec![] }
    }

    fn get(&self, option: &str) -> Option<&str> {
        self.options.iter()
            .find(|(k, _)| k == option)
            .map(|(_, v)| v.as_str())
    }

    fn get_mut(&mut self, option: &str) -> Option<&mut String> {
        self.options.iter_mut()
            .find(|(k, _)| k == option)
            .map(|(_, v)| v)
    }

    fn set(&mut self, option: String, value: String) {
        match self.get_mut(&option) {
            Some(v) => *v = value,
            None => self.options.push((option, value)),
        }
    }
}

/// Where option lines currently land while parsing.
#[derive(Clone, Copy)]
enum Target {
    Defaults,
    Section(usize),
}

/// Parsed INI data.
#[derive(Debug, Clone)]
pub struct Ini {
    defaults: Section,
    sections: Vec<Section>,
}

impl Default for Ini {
    fn default() -> Self { Self::new() }
}

impl Ini {
    pub fn new() -> Self {
        Ini { defaults: Section::new(DEFAULT_SECTION), sections: vec![] }
    }

    /// Parse `text` into a fresh [`Ini`].  `source_name` is only used
    /// in error messages.
    pub fn parse(text: &str, source_name: &str) -> Result<Self, Error> {
        let mut ini = Ini::new();
        ini.read_str(text, source_name)?;
        Ok(ini)
    }

    /// Read the file at `path` on top of the current content.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            Error::ConfigRead { path: path.to_path_buf(), source }
        })?;
        self.read_str(&text, &path.display().to_string())
    }

    /// Read `text` on top of the current content.
    pub fn read_str(
        &mut self, text: &str, source_name: &str) -> Result<(), Error> {
        let mut seen_sections = HashSet::new();
        let mut seen_options = HashSet::new();
        let mut target: Option<Target> = None;
        // Option receiving continuation lines, with its indentation.
        let mut last: Option<(String, usize)> = None;
        // Blank lines seen since the last line of `last`.
        let mut blanks = 0;

        for (i, raw) in text.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();
            let indent = raw.len() - raw.trim_start().len();
            if line.is_empty() {
                blanks += 1;
                continue;
            }
            if line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let (Some((option, opt_indent)), Some(t)) = (&last, target) {
                if indent > *opt_indent {
                    if let Some(v) = self.section_mut(t).get_mut(option) {
                        v.extend(std::iter::repeat('\n').take(blanks));
                        if !v.is_empty() {
                            v.push('\n');
                        }
                        v.push_str(line);
                    }
                    blanks = 0;
                    continue;
                }
            }
            last = None;
            blanks = 0;

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']')
                    .ok_or_else(|| Error::syntax(
                        source_name, lineno, "malformed section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(Error::syntax(
                        source_name, lineno, "empty section name"));
                }
                if !seen_sections.insert(name.to_string()) {
                    return Err(Error::syntax(
                        source_name, lineno,
                        format!("section {name:?} already exists")));
                }
                target = Some(self.target(name));
                continue;
            }

            let t = target.ok_or_else(|| Error::syntax(
                source_name, lineno, "option line before any section header"))?;
            let sep = line.find(|c: char| c == '=' || c == ':')
                .ok_or_else(|| Error::syntax(
                    source_name, lineno, "expected `option = value`"))?;
            let option = line[.. sep].trim().to_lowercase();
            if option.is_empty() {
                return Err(Error::syntax(
                    source_name, lineno, "empty option name"));
            }
            let value = line[sep + 1 ..].trim().to_string();
            let section = self.section_mut(t);
            if !seen_options.insert((section.name.clone(), option.clone())) {
                return Err(Error::syntax(
                    source_name, lineno,
                    format!("option {option:?} in section {:?} already exists",
                            section.name)));
            }
            section.set(option.clone(), value);
            last = Some((option, indent));
        }
        Ok(())
    }

    fn target(&mut self, name: &str) -> Target {
        // `DEFAULT` only ever feeds fallbacks.
        if name == DEFAULT_SECTION {
            return Target::Defaults;
        }
        match self.sections.iter().position(|s| s.name == name) {
            Some(i) => Target::Section(i),
            None => {
                self.sections.push(Section::new(name));
                Target::Section(self.sections.len() - 1)
            }
        }
    }

    fn section_mut(&mut self, t: Target) -> &mut Section {
        match t {
            Target::Defaults => &mut self.defaults,
            Target::Section(i) => &mut self.sections[i],
        }
    }

    /// Section names in order of first appearance, `DEFAULT` excluded.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    /// Return the raw value of `option` in `section`, falling back on
    /// the `DEFAULT` section.
    pub fn get(&self, section: &str, option: &str) -> Result<&str, Error> {
        let option = option.to_lowercase();
        let value = if section == DEFAULT_SECTION {
            self.defaults.get(&option)
        } else {
            let s = self.sections.iter()
                .find(|s| s.name == section)
                .ok_or_else(|| Error::MissingSection(section.to_string()))?;
            s.get(&option).or_else(|| self.defaults.get(&option))
        };
        value.ok_or_else(|| Error::MissingOption {
            section: section.to_string(),
            option,
        })
    }

    pub fn get_int(&self, section: &str, option: &str) -> Result<i64, Error> {
        let v = self.get(section, option)?;
        v.parse().map_err(|_| {
            Error::invalid_value(section, option, v, "an integer")
        })
    }

    pub fn get_float(&self, section: &str, option: &str) -> Result<f64, Error> {
        let v = self.get(section, option)?;
        v.parse().map_err(|_| {
            Error::invalid_value(section, option, v, "a number")
        })
    }

    pub fn get_bool(&self, section: &str, option: &str) -> Result<bool, Error> {
        let v = self.get(section, option)?;
        match v.to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(Error::invalid_value(section, option, v, "a boolean")),
        }
    }
}
