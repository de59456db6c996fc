//! Library side of the `artimine` binary: argument parsing and command dispatch.

pub mod app;
pub mod cli;
mod render;

pub use app::{analyze_archive, execute, run, AnalysisReport};
pub use cli::{Cli, Commands};
