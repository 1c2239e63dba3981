//! Site configuration management for `akre.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Source/output roots, minify, stylesheet mode     |
//! | `[serve]`   | Development server (port, interface, watch)      |
//!
//! The file is optional: without it every field takes its default, which
//! yields the conventional `src/` → `dist/` layout.
//!
//! # Source layout
//!
//! ```text
//! src/
//! ├── pages/<name>/<name>.{yaml,hbs,scss}
//! ├── partials/*.hbs
//! ├── static/**
//! ├── style/main.scss
//! └── globals.yaml
//! ```

mod build;
pub mod defaults;
mod error;
mod serve;

pub use build::StyleMode;
pub use error::ConfigError;

use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Extension of page data files and the globals file.
pub const DATA_EXT: &str = "yaml";
/// Extension of page templates and partials.
pub const TEMPLATE_EXT: &str = "hbs";
/// Extension of page and base stylesheets.
pub const STYLE_EXT: &str = "scss";

const PAGES_DIR: &str = "pages";
const PARTIALS_DIR: &str = "partials";
const STATIC_DIR: &str = "static";
const GLOBALS_FILE: &str = "globals.yaml";
const BASE_STYLE: &str = "style/main.scss";

/// Output subdirectory for copied static assets.
const ASSETS_DIR: &str = "assets";
/// Output-relative directory for compiled stylesheets.
pub const CSS_DIR: &str = "assets/css";
/// Output-relative directory for per-page stylesheets.
pub const PAGE_CSS_DIR: &str = "assets/css/pages";
/// File name of the compiled base stylesheet inside [`CSS_DIR`].
pub const BASE_CSS: &str = "main.css";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing akre.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project root; every relative path below is resolved against it
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Default configuration rooted at `root`, with all paths resolved.
    #[cfg(test)]
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(root);
        config
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => {
                Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
                self.build.clean |= build_args.clean;
            }
            Commands::Watch {
                build_args,
                interface,
                port,
            } => {
                Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
                self.build.clean |= build_args.clean;
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::New { .. } | Commands::Init => {}
        }

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.resolve_paths(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve source and output against `root` and normalize to absolute paths
    fn resolve_paths(&mut self, root: &Path) {
        self.root = Self::normalize_path(root);
        self.build.source = Self::normalize_path(&self.root.join(&self.build.source));
        self.build.output = Self::normalize_path(&self.root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Reject layouts where building would write into the tree it reads.
    ///
    /// An output directory inside the source root would also make every
    /// build retrigger the watcher.
    pub fn validate(&self) -> Result<()> {
        let source = &self.build.source;
        let output = &self.build.output;

        if output == source {
            bail!(ConfigError::Validation(
                "[build.output] must differ from [build.source]".into()
            ));
        }
        if output.starts_with(source) {
            bail!(ConfigError::Validation(format!(
                "[build.output] `{}` must not be inside [build.source] `{}`",
                output.display(),
                source.display()
            )));
        }
        if source.starts_with(output) {
            bail!(ConfigError::Validation(format!(
                "[build.source] `{}` must not be inside [build.output] `{}`",
                source.display(),
                output.display()
            )));
        }
        let tailwind = &self.build.tailwind;
        if tailwind.enable && self.build.style != StyleMode::Bundle {
            bail!(ConfigError::Validation(
                "[build.tailwind] requires `style = \"bundle\"`".into()
            ));
        }
        if tailwind.enable && tailwind.command.is_empty() {
            bail!(ConfigError::Validation(
                "[build.tailwind.command] must not be empty".into()
            ));
        }

        Ok(())
    }

    // ========================================================================
    // Source layout
    // ========================================================================

    pub fn pages_dir(&self) -> PathBuf {
        self.build.source.join(PAGES_DIR)
    }

    pub fn partials_dir(&self) -> PathBuf {
        self.build.source.join(PARTIALS_DIR)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.build.source.join(STATIC_DIR)
    }

    pub fn globals_path(&self) -> PathBuf {
        self.build.source.join(GLOBALS_FILE)
    }

    pub fn base_style_path(&self) -> PathBuf {
        self.build.source.join(BASE_STYLE)
    }

    // ========================================================================
    // Output layout
    // ========================================================================

    pub fn assets_target(&self) -> PathBuf {
        self.build.output.join(ASSETS_DIR)
    }

    pub fn css_target(&self) -> PathBuf {
        self.build.output.join(CSS_DIR)
    }

    pub fn page_css_target(&self) -> PathBuf {
        self.build.output.join(PAGE_CSS_DIR)
    }

    /// Output paths owned by the style compiler.
    ///
    /// Static files landing here would race with the compiled CSS.
    pub fn compiled_style_targets(&self) -> [PathBuf; 2] {
        [self.css_target().join(BASE_CSS), self.page_css_target()]
    }
}

// ============================================================================
// Tests
// ============================================================================
