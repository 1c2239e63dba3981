//! External command execution.
//!
//! Runs a configured command line, captures its output and turns a
//! non-zero exit into an error carrying the command's stderr.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
    sync::LazyLock,
};

/// Lines starting with any of these prefixes are not echoed.
pub struct FilterRule {
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();
        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Run `cmd` (program plus leading arguments) followed by `args`.
///
/// Empty arguments are dropped. On success stderr is logged through
/// `filter`; on failure it becomes the error message.
pub fn exec(
    root: Option<&Path>,
    cmd: &[String],
    args: &[OsString],
    filter: &FilterRule,
) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;
    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    if !output.status.success() {
        anyhow::bail!(format_error(&name, &output, filter));
    }
    filter.log(&name, String::from_utf8_lossy(&output.stderr).trim());
    Ok(output)
}

fn prepare(root: Option<&Path>, cmd: &[String], args: &[OsString]) -> Result<(String, Command)> {
    let (program, leading) = cmd.split_first().context("Empty command")?;

    let mut command = Command::new(program);
    command
        .args(leading)
        .args(args.iter().filter(|a| !a.is_empty()));
    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((program.clone(), command))
}

fn format_error(name: &str, output: &Output, filter: &FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    if !error_msg.is_empty() {
        msg.push('\n');
        msg.push_str(error_msg);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout);
    }
    msg
}

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(s, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    static NO_FILTER: FilterRule = FilterRule::new(&[]);

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_prepare_splits_program() {
        let cmd = vec!["npx".to_string(), "tailwindcss".to_string()];
        let args = [OsString::from(""), OsString::from("-i")];
        let (name, command) = prepare(None, &cmd, &args).unwrap();
        assert_eq!(name, "npx");

        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["tailwindcss", "-i"]);
    }

    #[test]
    fn test_filter_rule() {
        let filter = FilterRule::new(&["≈ tailwindcss", "Done in"]);
        assert!(filter.should_skip("≈ tailwindcss v3.4.1"));
        assert!(filter.should_skip("Done in 42ms."));
        assert!(filter.should_skip(""));
        assert!(!filter.should_skip("warn - no utility classes detected"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_reports_failure() {
        let cmd: Vec<String> = ["sh", "-c", "echo broken >&2; exit 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let err = exec(None, &cmd, &[], &NO_FILTER).unwrap_err().to_string();
        assert!(err.contains("Command `sh` failed"));
        assert!(err.contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_runs_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = vec!["pwd".to_string()];
        let output = exec(Some(dir.path()), &cmd, &[], &NO_FILTER).unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(printed.trim()).canonicalize().unwrap(), expected);
    }
}
