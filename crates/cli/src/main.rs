//! Command-line interface for the `artimine` application.
//!
//! This crate serves as the main entry point for the executable, delegating
//! its functionality to the `artimine_cli` library.

fn main() -> anyhow::Result<()> {
    artimine_cli::run()
}
