//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// akre static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Source directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Config file name (default: akre.toml)
    #[arg(short = 'C', long, default_value = "akre.toml", global = true)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Minify rendered pages and stylesheets
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one full build of every page, stylesheet and static asset
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then serve the output and rebuild on every source change
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scaffold empty data, template and style files for a new page
    New {
        /// Page name; becomes `pages/<name>/<name>.*`
        name: String,
    },

    /// Scaffold the source directory with an `index` page
    Init,
}
