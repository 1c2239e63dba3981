//! Stylesheet compilation.
//!
//! ```text
//! src/style/main.scss              ──► dist/assets/css/main.css         (once per build)
//! src/pages/<name>/<name>.scss     ──► dist/assets/css/pages/<name>.css (page mode only)
//! ```
//!
//! SCSS is compiled with `grass`; the resulting CSS is optionally passed
//! through `lightningcss` for vendor prefixes and minification. In bundle
//! mode with `[build.tailwind]` enabled, the base stylesheet goes through
//! the tailwind CLI first, with its content scoped to `pages/`.
//!
//! Page stylesheets live in their own directory, so no page name can
//! replace the base stylesheet.
//!
//! Pages receive the output-relative hrefs, base first. A stylesheet that
//! fails to compile still contributes its href: the link is emitted and
//! the failure is reported, so a broken page style never changes the
//! markup of the page that references it.

use crate::{
    config::{BASE_CSS, CSS_DIR, PAGE_CSS_DIR, STYLE_EXT, SiteConfig, StyleMode},
    log,
    utils::exec::{FilterRule, exec},
};
use lightningcss::{
    stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet},
    targets::{Browsers, Targets},
};
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Failure to produce one compiled stylesheet.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error("scss error in `{}`: {}", .0.display(), .1)]
    Scss(PathBuf, String),

    #[error("css error in `{}`: {}", .0.display(), .1)]
    Css(PathBuf, String),

    #[error("tailwind failed for `{}`: {}", .0.display(), .1)]
    Tailwind(PathBuf, String),

    #[error("cannot write `{}`: {}", .0.display(), .1)]
    Write(PathBuf, #[source] io::Error),
}

/// One stylesheet as seen by a page.
#[derive(Debug)]
pub struct CompiledStyle {
    /// Output-relative link target, e.g. `assets/css/main.css`.
    pub href: String,
    /// Set when compilation failed; `href` is kept regardless.
    pub error: Option<StyleError>,
}

/// Skip the version banner and timing line tailwind prints on success.
static TAILWIND_FILTER: FilterRule =
    FilterRule::new(&["≈ tailwindcss", "Done in", "Rebuilding"]);

/// Compile the shared base stylesheet, if the source has one.
pub fn compile_base(config: &SiteConfig) -> Option<CompiledStyle> {
    let source = config.base_style_path();
    if !source.is_file() {
        log!("info"; "no base stylesheet at `{}`", source.display());
        return None;
    }
    let purge = config.build.style == StyleMode::Bundle && config.build.tailwind.enable;

    let dest = config.css_target().join(BASE_CSS);
    let error = compile_file(&source, &dest, config, purge).err();
    Some(CompiledStyle {
        href: format!("{CSS_DIR}/{BASE_CSS}"),
        error,
    })
}

/// Compile `pages/<name>/<name>.scss`, if present.
pub fn compile_page(page_dir: &Path, name: &str, config: &SiteConfig) -> Option<CompiledStyle> {
    let source = page_dir.join(format!("{name}.{STYLE_EXT}"));
    if !source.is_file() {
        return None;
    }
    let file_name = format!("{name}.css");

    let dest = config.page_css_target().join(&file_name);
    let error = compile_file(&source, &dest, config, false).err();
    Some(CompiledStyle {
        href: format!("{PAGE_CSS_DIR}/{file_name}"),
        error,
    })
}

/// Compile one SCSS file to `dest`.
///
/// Imports are resolved relative to the source file's directory. With
/// `purge` set the compiled CSS is handed to tailwind before prefixing.
fn compile_file(
    source: &Path,
    dest: &Path,
    config: &SiteConfig,
    purge: bool,
) -> Result<(), StyleError> {
    let load_path = source.parent().unwrap_or(Path::new("."));
    let options = grass::Options::default().load_path(load_path);
    let css = grass::from_path(source, &options)
        .map_err(|e| StyleError::Scss(source.to_path_buf(), e.to_string()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| StyleError::Write(parent.to_path_buf(), e))?;
    }

    let css = if purge {
        run_tailwind(&css, source, dest, config)?
    } else {
        css
    };

    let css = if config.build.prefix || config.build.minify {
        postprocess(&css, source, config.build.minify)?
    } else {
        css
    };

    fs::write(dest, css).map_err(|e| StyleError::Write(dest.to_path_buf(), e))
}

/// Pass compiled CSS through the configured tailwind command.
///
/// The CSS is staged next to `dest`, tailwind writes `dest`, and the
/// result is read back for post-processing. Content is every file under
/// `pages/`.
fn run_tailwind(
    css: &str,
    source: &Path,
    dest: &Path,
    config: &SiteConfig,
) -> Result<String, StyleError> {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staged = dest.with_file_name(format!(".{file_name}.input"));
    fs::write(&staged, css).map_err(|e| StyleError::Write(staged.clone(), e))?;

    let content = config.pages_dir().join("**").join("*");
    let args: [OsString; 7] = [
        "-i".into(),
        staged.clone().into(),
        "-o".into(),
        dest.into(),
        "--content".into(),
        content.into(),
        (if config.build.minify { "--minify" } else { "" }).into(),
    ];
    let result = exec(
        Some(&config.root),
        &config.build.tailwind.command,
        &args,
        &TAILWIND_FILTER,
    );
    // staging file is scratch either way
    let _ = fs::remove_file(&staged);
    result.map_err(|e| StyleError::Tailwind(source.to_path_buf(), format!("{e:#}")))?;

    fs::read_to_string(dest).map_err(|e| StyleError::Tailwind(dest.to_path_buf(), e.to_string()))
}

/// Browsers the prefixed output must support.
fn browser_targets() -> Targets {
    // Versions are encoded as `major << 16 | minor << 8 | patch`.
    Targets::from(Browsers {
        chrome: Some(95 << 16),
        edge: Some(95 << 16),
        firefox: Some(90 << 16),
        safari: Some(13 << 16),
        ios_saf: Some(13 << 16),
        ..Browsers::default()
    })
}

/// Add vendor prefixes for [`browser_targets`] and optionally minify.
fn postprocess(css: &str, source: &Path, minify: bool) -> Result<String, StyleError> {
    let css_error = |message: String| StyleError::Css(source.to_path_buf(), message);

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: source.display().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| css_error(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    Ok(printed.code)
}
