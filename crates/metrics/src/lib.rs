//! Contribution and ownership metrics for extracted projects.
//!
//! Every engine prefers git history when the project is a work tree and
//! falls back to filesystem signals otherwise:
//! - [`ContributionAnalyzer`]: project duration and per-category churn
//! - [`compute_oaci`]: Ownership-Adjusted Contribution Impact scores
//! - [`ContributorAnalyzer`]: per-author commits and line counts
//! - [`CollabDetector`]: collaborator count estimation

#![deny(unsafe_code)]

pub mod categories;
pub mod collab;
pub mod contribution;
pub mod contributors;
pub mod git;
pub mod oaci;

pub use categories::{
    classify_path, CategoryClassifier, CategoryCounts, FileCategory, DEFAULT_CATEGORY_PATTERNS,
};
pub use collab::{CollabDetector, CollaboratorEstimate, CollaboratorSource};
pub use contribution::{
    format_duration, ContributionAnalyzer, ContributionMetrics, MetricsSource, ProjectDuration,
};
pub use contributors::{
    aggregate_commits, merge_duplicates, parse_numstat_log, parse_shortlog, CommitStat,
    ContributorAnalyzer, ContributorInfo, FileStat, ShortlogEntry,
};
pub use git::{GitCommand, GitError, RecordingGit, SystemGit, DEFAULT_GIT_TIMEOUT};
pub use oaci::{
    compute_oaci, compute_review_influence_score, pr_breakdown, FileChange, IncidentFix,
    OaciConfig, OaciInput, PrId, PrScore, PullRequest, Review, DEFAULT_CHURN_WINDOW_DAYS,
};
