//! Shared helpers for the build pipeline.

pub mod exec;
pub mod log;
pub mod minify;
