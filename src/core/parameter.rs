// File: src/core/parameter.rs
use crate::error::{DecoderError, Result};
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const KNOWN_SECTIONS: &[&str] = &[
    "ttable-file",
    "lmodel-file",
    "weight-d",
    "weight-l",
    "weight-t",
    "weight-w",
    "weight-u",
    "distortion-limit",
    "stack",
    "beam-threshold",
    "ttable-limit",
    "max-phrase-length",
    "factor-delimiter",
    "verbose",
];

/// Raw decoder configuration: a map from section name to its value lines.
///
/// Values come from a Moses-style ini file and may be overridden from the
/// command line with `-section v1 v2 ...`.
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    base_dir: PathBuf,
    origin: PathBuf,
    sections: HashMap<String, Vec<String>>,
}

impl Parameter {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DecoderError::io(path, e))?;
        let mut param = Self::parse(&text, path)?;
        param.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(param)
    }

    /// Parses ini text. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut sections: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                if !KNOWN_SECTIONS.contains(&name.as_str()) {
                    warn!("ignoring unknown configuration section [{}]", name);
                }
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            match &current {
                Some(name) => sections.entry(name.clone()).or_default().push(line.to_string()),
                None => {
                    return Err(DecoderError::format(
                        origin,
                        idx + 1,
                        format!("value '{}' appears before any [section]", line),
                    ))
                }
            }
        }

        Ok(Self {
            base_dir: PathBuf::from("."),
            origin: origin.to_path_buf(),
            sections,
        })
    }

    /// Applies `-key v1 v2 ...` overrides. A key replaces every value of its
    /// section with a single line holding `v1 v2 ...`.
    pub fn override_with_args(&mut self, args: &[String]) -> Result<()> {
        let mut overrides: Vec<(String, Vec<&str>)> = Vec::new();
        for arg in args {
            if is_switch(arg) {
                overrides.push((arg.trim_start_matches('-').to_string(), Vec::new()));
            } else {
                match overrides.last_mut() {
                    Some((_, values)) => values.push(arg),
                    None => {
                        return Err(DecoderError::InvalidConfig(format!(
                            "argument '{}' is not preceded by a -switch",
                            arg
                        )))
                    }
                }
            }
        }
        for (key, values) in overrides {
            let lines = if values.is_empty() { Vec::new() } else { vec![values.join(" ")] };
            self.sections.insert(key, lines);
        }
        Ok(())
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.sections.contains_key(key)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.sections.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first value of a section parsed as `T`, or `default` if absent.
    pub fn single<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.values(key).first() {
            Some(v) => v.parse().map_err(|_| {
                DecoderError::InvalidConfig(format!("[{}] has unparsable value '{}'", key, v))
            }),
            None => Ok(default),
        }
    }

    /// Every value of a section as floats. Values may also be space separated.
    pub fn floats(&self, key: &str) -> Result<Vec<f32>> {
        self.values(key)
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(|v| {
                v.parse::<f32>().map_err(|_| {
                    DecoderError::InvalidConfig(format!("[{}] has non-numeric weight '{}'", key, v))
                })
            })
            .collect()
    }

    /// Resolves a model path relative to the ini file's directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }
}

/// `-stack` is a switch, `-1` and `-0.5` are values.
fn is_switch(arg: &str) -> bool {
    let rest = arg.trim_start_matches('-');
    arg.starts_with('-')
        && !rest.is_empty()
        && !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}
