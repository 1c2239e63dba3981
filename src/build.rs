//! Site building orchestration.
//!
//! Every invocation is a full rebuild:
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()        clean (optional), create assets/css
//!     ├── Registry::load()        partials + breaklines helper
//!     ├── Globals::load()         globals.yaml
//!     ├── style::compile_base()   style/main.scss
//!     ├── discover_pages()        pages/*  (the only fatal step)
//!     │
//!     └── rayon::join
//!             ├── build_page() for every page (parallel)
//!             └── copy_static()
//! ```
//!
//! Shared state (registry, globals, base stylesheet) is built once and only
//! borrowed by the page builds. Both sides of the join complete before
//! [`build_site`] returns, so the output tree is fully written by then.

use crate::{
    assets::{self, AssetReport},
    config::SiteConfig,
    data::Globals,
    error::StepError,
    log,
    page::{BuildContext, PageOutcome, PageReport, build_page},
    registry::Registry,
    style,
};
use rayon::prelude::*;
use std::{
    fs,
    time::{Duration, Instant},
};

/// Aggregate result of one build invocation.
#[derive(Debug)]
pub struct BuildSummary {
    /// One report per discovered page, in page-name order.
    pub pages: Vec<PageReport>,
    pub assets_copied: usize,
    /// Non-fatal problems outside individual pages.
    pub step_errors: Vec<StepError>,
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn succeeded(&self) -> usize {
        self.pages.iter().filter(|p| p.is_success()).count()
    }

    /// Pages that produced no output file.
    pub fn skipped(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| {
                matches!(
                    p.outcome(),
                    PageOutcome::MissingDataFile
                        | PageOutcome::MissingTemplateFile
                        | PageOutcome::TemplateRenderError
                )
            })
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.step_errors.is_empty() && self.pages.iter().all(PageReport::is_success)
    }
}

/// Build the entire site.
///
/// Only an unreadable pages directory fails the build; every other problem
/// is logged, collected in the summary, and the build carries on.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary, StepError> {
    let start = Instant::now();
    let mut step_errors = prepare_output(config);

    let (registry, partial_errors) = Registry::load(&config.partials_dir());
    step_errors.extend(partial_errors);

    let (globals, globals_error) = Globals::load(&config.globals_path());
    step_errors.extend(globals_error.map(StepError::Globals));

    let base_style = style::compile_base(config);
    if let Some(err) = base_style.as_ref().and_then(|s| s.error.as_ref()) {
        log!("error"; "could not compile base stylesheet: {err}");
    }

    let pages = discover_pages(config)?;
    log!("build"; "building {} pages", pages.len());

    let ctx = BuildContext {
        config,
        registry: &registry,
        globals: &globals,
        base_style: base_style.as_ref().map(|s| s.href.as_str()),
    };

    let (reports, assets): (Vec<PageReport>, AssetReport) = rayon::join(
        || pages.par_iter().map(|name| build_page(name, &ctx)).collect(),
        || {
            assets::copy_static(
                &config.static_dir(),
                &config.assets_target(),
                &config.compiled_style_targets(),
            )
        },
    );

    step_errors.extend(base_style.and_then(|s| s.error).map(StepError::BaseStyle));
    step_errors.extend(assets.errors);

    let summary = BuildSummary {
        pages: reports,
        assets_copied: assets.copied,
        step_errors,
        elapsed: start.elapsed(),
    };
    log_build_result(&summary);

    Ok(summary)
}

/// Clean (when configured) and create the output directories.
///
/// Failures are logged and returned; page writes will then fail
/// individually and be reported per page.
fn prepare_output(config: &SiteConfig) -> Vec<StepError> {
    let mut errors = Vec::new();
    let output = &config.build.output;

    if config.build.clean
        && output.exists()
        && let Err(e) = fs::remove_dir_all(output)
    {
        errors.push(StepError::DirectoryClean(output.clone(), e));
    }

    let css = config.css_target();
    if let Err(e) = fs::create_dir_all(&css) {
        errors.push(StepError::DirectoryCreate(css, e));
    }

    for err in &errors {
        log!("error"; "{err}");
    }
    errors
}

/// List page names: every directory directly under `pages/`, sorted.
fn discover_pages(config: &SiteConfig) -> Result<Vec<String>, StepError> {
    let pages_dir = config.pages_dir();
    let entries = fs::read_dir(&pages_dir).map_err(|e| {
        let err = StepError::PagesRead(pages_dir.clone(), e);
        log!("error"; "{err}");
        err
    })?;

    let mut pages = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            pages.push(name);
        } else {
            log!("info"; "pages directory contains non-directory entry: {name}");
        }
    }
    pages.sort();
    Ok(pages)
}

fn log_build_result(summary: &BuildSummary) {
    let total = summary.pages.len();

    if total == 0 {
        log!("warn"; "no pages found, check the pages directory");
    } else if summary.is_clean() {
        log!("build"; "{total} pages built");
    } else {
        log!(
            "build";
            "{}/{total} pages built cleanly, {} skipped",
            summary.succeeded(),
            summary.skipped()
        );
    }
    log!("info"; "build executed in {}ms", summary.elapsed.as_millis());
}
