//! Build error taxonomy.
//!
//! [`PageError`] is scoped to one page, [`StepError`] to one orchestrator
//! step. Except for [`StepError::PagesRead`], none of them stop a build.

use crate::{data::DataError, style::StyleError};
use std::{io, path::PathBuf};
use thiserror::Error;

/// A problem building one page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("data file not found for page {page}")]
    MissingDataFile { page: String, path: PathBuf },

    #[error("template file not found for page {page}")]
    MissingTemplateFile { page: String, path: PathBuf },

    #[error("could not parse data file {page}.{ext}: {source}", ext = crate::config::DATA_EXT)]
    DataParse {
        page: String,
        #[source]
        source: DataError,
    },

    #[error("could not compile stylesheet {page}.{ext}: {source}", ext = crate::config::STYLE_EXT)]
    StyleCompile {
        page: String,
        #[source]
        source: StyleError,
    },

    #[error("could not render template {page}.{ext}: {source}", ext = crate::config::TEMPLATE_EXT)]
    TemplateRender {
        page: String,
        #[source]
        source: RenderFailure,
    },
}

/// Why a page template produced no output file.
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("cannot read `{}`: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    #[error("{0}")]
    Engine(#[from] handlebars::RenderError),

    #[error("cannot write `{}`: {}", .0.display(), .1)]
    Write(PathBuf, #[source] io::Error),
}

/// A problem in one orchestrator step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("could not create target directory `{}`: {}", .0.display(), .1)]
    DirectoryCreate(PathBuf, #[source] io::Error),

    #[error("could not clean target directory `{}`: {}", .0.display(), .1)]
    DirectoryClean(PathBuf, #[source] io::Error),

    #[error("could not read partials directory `{}`: {}", .0.display(), .1)]
    PartialsRead(PathBuf, #[source] io::Error),

    #[error("could not register partial `{name}`: {source}")]
    PartialRegister {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("could not load globals: {0}")]
    Globals(#[source] DataError),

    #[error("could not compile base stylesheet: {0}")]
    BaseStyle(#[source] StyleError),

    #[error("could not copy static asset `{}`: {}", .0.display(), .1)]
    AssetCopy(PathBuf, #[source] io::Error),

    #[error("static asset `{}` would overwrite compiled stylesheet `{}`", .0.display(), .1.display())]
    AssetShadowsStyle(PathBuf, PathBuf),

    #[error("could not walk static directory: {0}")]
    AssetWalk(#[from] walkdir::Error),

    #[error("could not read pages directory `{}`: {}", .0.display(), .1)]
    PagesRead(PathBuf, #[source] io::Error),
}

impl PageError {
    /// Whether the page was skipped without producing output.
    pub const fn is_fatal_for_page(&self) -> bool {
        matches!(
            self,
            Self::MissingDataFile { .. } | Self::MissingTemplateFile { .. } | Self::TemplateRender { .. }
        )
    }
}
