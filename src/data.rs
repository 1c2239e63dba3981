//! Page data and globals loading.
//!
//! Both page data (`pages/<name>/<name>.yaml`) and the shared globals file
//! are YAML documents whose top level must be a mapping. They are converted
//! into JSON-shaped [`Mapping`]s so the template engine sees one uniform
//! value model.

use crate::log;
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// A parsed data document.
pub type Mapping = serde_json::Map<String, Value>;

/// Failure to turn a data file into a [`Mapping`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read `{}`: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid yaml in `{}`: {}", .0.display(), .1)]
    Yaml(PathBuf, #[source] serde_yaml::Error),

    #[error("`{}` must contain a mapping at the top level, found {}", .0.display(), .1)]
    NotMapping(PathBuf, &'static str),
}

/// Read and parse one data file.
pub fn load_data(path: &Path) -> Result<Mapping, DataError> {
    let text = fs::read_to_string(path).map_err(|e| DataError::Io(path.to_path_buf(), e))?;
    parse_data(&text).map_err(|kind| match kind {
        ParseFailure::Yaml(e) => DataError::Yaml(path.to_path_buf(), e),
        ParseFailure::NotMapping(found) => DataError::NotMapping(path.to_path_buf(), found),
    })
}

enum ParseFailure {
    Yaml(serde_yaml::Error),
    NotMapping(&'static str),
}

/// Parse YAML text into a mapping.
///
/// Empty documents (blank, or only comments) yield an empty mapping.
/// Merge keys (`<<: *anchor`) are resolved before conversion.
fn parse_data(text: &str) -> Result<Mapping, ParseFailure> {
    if text.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
        return Ok(Mapping::new());
    }

    let mut yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(ParseFailure::Yaml)?;
    yaml.apply_merge().map_err(ParseFailure::Yaml)?;

    match serde_yaml::from_value::<Value>(yaml).map_err(ParseFailure::Yaml)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        Value::Array(_) => Err(ParseFailure::NotMapping("a sequence")),
        Value::String(_) => Err(ParseFailure::NotMapping("a string")),
        Value::Number(_) => Err(ParseFailure::NotMapping("a number")),
        Value::Bool(_) => Err(ParseFailure::NotMapping("a boolean")),
    }
}

// ============================================================================
// Globals
// ============================================================================

/// Data shared by every page of one build, exposed to templates as `globals`.
///
/// Loaded once per build and only ever borrowed afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals(Mapping);

impl Globals {
    /// Load the globals file, degrading to an empty mapping on any failure.
    ///
    /// Returns the error alongside so the build can report it.
    pub fn load(path: &Path) -> (Self, Option<DataError>) {
        match load_data(path) {
            Ok(map) => (Self(map), None),
            Err(e) => {
                log!("error"; "could not load globals: {e}");
                (Self::default(), Some(e))
            }
        }
    }

    pub fn as_map(&self) -> &Mapping {
        &self.0
    }
}

impl From<Mapping> for Globals {
    fn from(map: Mapping) -> Self {
        Self(map)
    }
}
