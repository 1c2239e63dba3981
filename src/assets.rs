//! Static asset copying.
//!
//! Mirrors the `static/` tree into the output `assets/` directory verbatim.
//! Paths owned by the style compiler are never written here: the copy runs
//! alongside page builds, so such files are skipped and reported.

use crate::{error::StepError, log};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Result of copying the static tree.
#[derive(Debug, Default)]
pub struct AssetReport {
    pub copied: usize,
    pub errors: Vec<StepError>,
}

/// Recursively copy every file under `source` into `target`.
///
/// A missing `source` is not an error. Failures on individual entries are
/// logged and collected; the remaining files are still copied. Files whose
/// destination equals or lies under one of `reserved` are skipped with an
/// [`StepError::AssetShadowsStyle`].
pub fn copy_static(source: &Path, target: &Path, reserved: &[PathBuf]) -> AssetReport {
    let mut report = AssetReport::default();

    if !source.is_dir() {
        log!("info"; "no static directory at {}, skipping assets", source.display());
        return report;
    }

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.fail(StepError::AssetWalk(e));
                continue;
            }
        };

        // min_depth(1) guarantees every entry sits below `source`
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);

        if !entry.file_type().is_dir()
            && let Some(owner) = reserved.iter().find(|r| dest.starts_with(r))
        {
            report.fail(StepError::AssetShadowsStyle(entry.path().to_path_buf(), owner.clone()));
            continue;
        }

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
        } else {
            dest.parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|()| fs::copy(entry.path(), &dest).map(|_| ()))
        };

        match result {
            Ok(()) if !entry.file_type().is_dir() => report.copied += 1,
            Ok(()) => {}
            Err(e) => report.fail(StepError::AssetCopy(entry.path().to_path_buf(), e)),
        }
    }

    report
}

impl AssetReport {
    fn fail(&mut self, err: StepError) {
        log!("error"; "{err}");
        self.errors.push(err);
    }
}
