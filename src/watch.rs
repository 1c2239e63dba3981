//! File system watcher that rebuilds the site on change.
//!
//! Every relevant event under the source root triggers one full rebuild.
//! Rebuilds are serialized on the watcher thread through a single pending
//! slot: events that arrive while a build runs stay queued in the channel,
//! and once the build finishes they are drained together into exactly one
//! follow-up rebuild.
//!
//! ```text
//! notify ──► channel ──► RebuildSlot ──► build_site()
//!                 ▲                           │
//!                 └──── queued during build ──┘
//! ```

use crate::{build::build_site, config::SiteConfig, log};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, TryRecvError},
};

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Pending rebuild slot
// =============================================================================

/// Holds at most one pending rebuild, remembering the first path that
/// requested it.
#[derive(Debug, Default)]
struct RebuildSlot {
    trigger: Option<PathBuf>,
    coalesced: usize,
}

impl RebuildSlot {
    /// Offer an event; returns whether it requested a rebuild.
    fn offer(&mut self, event: Event) -> bool {
        if !is_relevant(&event) {
            return false;
        }
        let Some(path) = event.paths.into_iter().find(|p| !is_temp_file(p)) else {
            return false;
        };
        match self.trigger {
            Some(_) => self.coalesced += 1,
            None => self.trigger = Some(path),
        }
        true
    }

    /// Empty the slot, returning the trigger path and how many further
    /// events were folded into it.
    fn take(&mut self) -> Option<(PathBuf, usize)> {
        let trigger = self.trigger.take()?;
        Some((trigger, std::mem::take(&mut self.coalesced)))
    }

    /// Move every already-queued event into the slot without blocking.
    ///
    /// Returns false once the sender side is gone.
    fn drain(&mut self, rx: &Receiver<notify::Result<Event>>) -> bool {
        loop {
            match rx.try_recv() {
                Ok(Ok(event)) => {
                    self.offer(event);
                }
                Ok(Err(e)) => log!("watch"; "error: {e}"),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

// =============================================================================
// Rebuild
// =============================================================================

fn rebuild(config: &SiteConfig, trigger: &Path, coalesced: usize) {
    let trigger = rel_path(trigger, &config.build.source);
    match coalesced {
        0 => log!("watch"; "{trigger} changed, rebuilding..."),
        n => log!("watch"; "{trigger} and {n} more changed, rebuilding..."),
    }

    if let Err(e) = build_site(config) {
        log!("watch"; "build failed ({trigger})");
        log!("watch"; "{e}");
    }
    eprintln!(); // Blank line to separate rebuild sessions
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the source root and rebuild on every change. Blocks forever.
pub fn watch_for_changes_blocking(config: &SiteConfig) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let source = &config.build.source;
    watcher
        .watch(source, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", source.display()))?;
    log!("watch"; "watching {}", rel_path(source, &config.root));

    let mut slot = RebuildSlot::default();

    while let Ok(message) = rx.recv() {
        match message {
            Ok(event) => {
                slot.offer(event);
            }
            Err(e) => log!("watch"; "error: {e}"),
        }
        let connected = slot.drain(&rx);

        if let Some((trigger, coalesced)) = slot.take() {
            rebuild(config, &trigger, coalesced);
        }
        if !connected {
            break;
        }
    }

    Ok(())
}
