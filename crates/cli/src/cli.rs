use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the `artimine` application.
#[derive(Debug, Parser)]
#[command(
    name = "artimine",
    version,
    about = "Mines skills, languages and contribution metrics from project archives"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `artimine` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Prints the directory tree of a ZIP archive without extracting it.
    Tree {
        /// Path to the ZIP archive.
        archive: PathBuf,
    },
    /// Lists every non-ignored file under a directory with sizes.
    Walk {
        dir: PathBuf,
    },
    /// Detects tools and practices from file names and paths.
    Skills {
        dir: PathBuf,
        /// Stores the detected skills in the database.
        #[arg(long, default_value_t = false)]
        save: bool,
        /// Project name to store under (default: directory name).
        #[arg(long, value_name = "NAME", requires = "save")]
        project: Option<String>,
    },
    /// Detects the dominant language and frameworks.
    Detect {
        dir: PathBuf,
    },
    /// Reports how long the project has been worked on.
    Duration {
        dir: PathBuf,
    },
    /// Counts file activity per category.
    Metrics {
        dir: PathBuf,
    },
    /// Estimates the number of collaborators.
    Collaborators {
        dir: PathBuf,
    },
    /// Lists git contributors with commit and line counts.
    Contributors {
        dir: PathBuf,
        /// Merges entries whose names differ only in case or spacing.
        #[arg(long, default_value_t = false)]
        merge_duplicates: bool,
    },
    /// Computes OACI scores from a JSON document of PRs, reviews and incidents.
    Oaci {
        /// JSON file with `prs`, `reviews`, `incidents` and optional `criticality`.
        input: PathBuf,
        /// Churn look-back window (overrides `ARTIMINE_CHURN_WINDOW_DAYS`).
        #[arg(long, value_name = "DAYS")]
        churn_window_days: Option<i64>,
    },
    /// Extracts an archive and runs the full analysis pipeline.
    Analyze {
        archive: PathBuf,
        /// Stores detected skills under the archive's name.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}
