//! Leveled terminal diagnostics with colored module prefixes.
//!
//! Every diagnostic the build emits goes through [`log!`]:
//!
//! ```ignore
//! log!("error"; "data file not found for page {}", name);
//! log!("info"; "build executed in {}ms", elapsed);
//! ```
//!
//! The module tag doubles as the level: `error` is rendered red, `info` and
//! `watch` green, `serve` blue, anything else yellow.

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Width used when stdout is not a terminal.
const FALLBACK_WIDTH: u16 = 160;

#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

/// Write one diagnostic line, truncated to the terminal width.
///
/// Multi-line messages (e.g. template errors with source excerpts) are
/// printed line by line under the same prefix.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let width = get_terminal_width() as usize;
    let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));

    let mut stdout = stdout().lock();
    for line in message.lines() {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
        writeln!(stdout, "{prefix} {}", truncate_str(line, max_msg_len)).ok();
    }
    stdout.flush().ok();
}

#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "info" | "watch" => prefix.bright_green().bold(),
        "serve" => prefix.bright_blue().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to at most `max_len` bytes on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "error" -> "[error] "
        assert_eq!(calc_prefix_len(5), 8);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_fits() {
        assert_eq!(truncate_str("build executed in 12ms", 64), "build executed in 12ms");
        assert_eq!(truncate_str("", 10), "");
    }

    #[test]
    fn test_truncate_str_cuts() {
        assert_eq!(truncate_str("template file not found", 8), "template");
        assert_eq!(truncate_str("page", 0), "");
    }

    #[test]
    fn test_truncate_str_respects_char_boundary() {
        // "é" is 2 bytes; cutting at byte 2 would split it
        assert_eq!(truncate_str("aé", 2), "a");
        assert_eq!(truncate_str("aé", 3), "aé");
    }

    #[test]
    fn test_log_multiline_does_not_panic() {
        log("error", "first line\nsecond line");
        log("info", "");
    }
}
