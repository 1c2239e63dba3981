//! Partial and helper registry for page templates.
//!
//! A fresh [`Registry`] is built at the start of every build by scanning the
//! partials directory, then shared read-only by all pages of that build.
//! Besides partials it carries the `breaklines` helper:
//!
//! ```handlebars
//! <p>{{breaklines description}}</p>
//! ```

use crate::{
    config::TEMPLATE_EXT,
    error::StepError,
    log,
    page::RenderContext,
};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderError};
use regex::Regex;
use serde_json::Value;
use std::{
    ffi::OsStr,
    fs,
    path::Path,
    sync::LazyLock,
};

/// Line-break sequences replaced by `breaklines`.
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// Markup substituted for each line break.
const BREAK_TAG: &str = "<br>";

/// Templates, partials and helpers available to every page in one build.
pub struct Registry {
    hbs: Handlebars<'static>,
}

impl Registry {
    /// An empty registry with the built-in helpers registered.
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_helper("breaklines", Box::new(breaklines_helper));
        Self { hbs }
    }

    /// Scan `dir` and register every template file under its file stem.
    ///
    /// Non-template entries are skipped with an `info` diagnostic. An
    /// unreadable directory leaves the registry without partials; the
    /// problems are returned for the build summary.
    pub fn load(dir: &Path) -> (Self, Vec<StepError>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        let mut entries: Vec<_> = match fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(Result::ok).map(|e| e.path()).collect(),
            Err(e) => {
                let err = StepError::PartialsRead(dir.to_path_buf(), e);
                log!("error"; "{err}");
                errors.push(err);
                return (registry, errors);
            }
        };
        entries.sort();

        let mut registered = 0;
        for path in entries {
            let name = match partial_name(&path) {
                Ok(name) => name,
                Err(notice) => {
                    log!("info"; "{notice}");
                    continue;
                }
            };

            let result = fs::read_to_string(&path)
                .map_err(|e| StepError::PartialsRead(path.clone(), e))
                .and_then(|source| registry.register_partial(name, &source));
            match result {
                Ok(()) => registered += 1,
                Err(err) => {
                    log!("error"; "{err}");
                    errors.push(err);
                }
            }
        }

        log!("partials"; "registered {registered}");
        (registry, errors)
    }

    /// Register one partial, replacing any existing partial of the same name.
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<(), StepError> {
        self.hbs
            .register_partial(name, source)
            .map_err(|e| StepError::PartialRegister {
                name: name.to_owned(),
                source: Box::new(e),
            })
    }

    /// Compile `template` and render it against `context`.
    pub fn render(&self, template: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        self.hbs.render_template(template, context)
    }
}

/// Partial name for `path`, or the notice explaining why it is skipped.
fn partial_name(path: &Path) -> Result<&str, String> {
    let file_name = path.file_name().map(OsStr::to_string_lossy).unwrap_or_default();

    if !path.is_file() || path.extension() != Some(OsStr::new(TEMPLATE_EXT)) {
        return Err(format!(
            "partials directory contains non .{TEMPLATE_EXT} file: {file_name}"
        ));
    }
    path.file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| format!("skipping partial with non utf-8 name: {file_name}"))
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// breaklines helper
// ============================================================================

fn breaklines_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h.param(0).map(|p| display_value(p.value())).unwrap_or_default();
    out.write(&break_lines(&text))?;
    Ok(())
}

/// HTML-escape `text`, then turn every line break into `<br>`.
///
/// The result is written unescaped by the helper.
pub fn break_lines(text: &str) -> String {
    let escaped = handlebars::html_escape(text);
    LINE_BREAK.replace_all(&escaped, BREAK_TAG).into_owned()
}

/// Text form of a helper argument; missing values render as nothing.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
