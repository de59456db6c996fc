//! Project duration and per-category churn, from git history or the filesystem.

use crate::categories::{CategoryClassifier, CategoryCounts, FileCategory};
use crate::git::{GitCommand, SystemGit};
use artimine_discovery::{relative_posix_path, IgnorePatterns};
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
const GIT_FAILED_SUMMARY: &str = "Failed to determine duration from git history";
const NO_FILES_SUMMARY: &str = "No files found";

/// Where a metric came from. Git and filesystem counts are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    Git,
    Filesystem,
}

/// Per-category counts tagged with their source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionMetrics {
    /// Touches per category for git, current files per category for filesystem.
    pub counts: CategoryCounts,
    pub source: MetricsSource,
}

impl ContributionMetrics {
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn get(&self, category: FileCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

/// Span between the earliest and latest observed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDuration {
    #[serde(rename = "duration_seconds", serialize_with = "serialize_seconds")]
    pub duration: Duration,
    pub summary: String,
    pub source: MetricsSource,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl ProjectDuration {
    fn empty(source: MetricsSource, summary: &str) -> Self {
        Self {
            duration: Duration::zero(),
            summary: summary.to_string(),
            source,
            first: None,
            last: None,
        }
    }

    fn from_span(source: MetricsSource, first: DateTime<Utc>, last: DateTime<Utc>) -> Self {
        let duration = last - first;
        Self {
            duration,
            summary: format_duration(duration),
            source,
            first: Some(first),
            last: Some(last),
        }
    }

    /// Whether any timestamp was observed.
    pub fn has_data(&self) -> bool {
        self.first.is_some()
    }
}

fn serialize_seconds<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

/// Ordered fallback chain used by the `get_*` entry points.
const STRATEGIES: [MetricsSource; 2] = [MetricsSource::Git, MetricsSource::Filesystem];

/// Computes duration and contribution metrics for an extracted project.
#[derive(Debug, Clone)]
pub struct ContributionAnalyzer<G = SystemGit> {
    git: G,
    ignore: IgnorePatterns,
    classifier: CategoryClassifier,
}

impl Default for ContributionAnalyzer<SystemGit> {
    fn default() -> Self {
        Self::new(SystemGit::default(), IgnorePatterns::default())
    }
}

impl<G: GitCommand> ContributionAnalyzer<G> {
    pub fn new(git: G, ignore: IgnorePatterns) -> Self {
        Self {
            git,
            ignore,
            classifier: CategoryClassifier::default(),
        }
    }

    /// Replaces the category patterns.
    pub fn with_classifier(mut self, classifier: CategoryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn is_git_repo(&self, root: &Path) -> bool {
        self.git.is_work_tree(root)
    }

    /// Duration between the first and last commit on any ref.
    pub fn git_project_duration(&self, root: &Path) -> ProjectDuration {
        let output = match self
            .git
            .run(root, &["log", "--all", "--pretty=format:%ad", "--date=iso"])
        {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "git log for duration failed");
                return ProjectDuration::empty(MetricsSource::Git, GIT_FAILED_SUMMARY);
            }
        };

        let dates = output.lines().filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match DateTime::parse_from_str(line, GIT_DATE_FORMAT) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    tracing::debug!(error = %e, line, "unparseable commit date");
                    None
                }
            }
        });

        match span(dates) {
            Some((first, last)) => ProjectDuration::from_span(MetricsSource::Git, first, last),
            None => ProjectDuration::empty(MetricsSource::Git, GIT_FAILED_SUMMARY),
        }
    }

    /// Duration spanned by file creation and modification times.
    ///
    /// Hidden files and anything under an ignored directory are excluded.
    pub fn filesystem_project_duration(&self, root: &Path) -> ProjectDuration {
        let times = self
            .project_files(root, true)
            .into_iter()
            .filter_map(|(path, _)| match path.metadata() {
                Ok(meta) => Some(file_times(&meta)),
                Err(e) => {
                    tracing::debug!(error = %e, path = %path.display(), "skipping file without metadata");
                    None
                }
            })
            .flatten();

        match span(times) {
            Some((first, last)) => {
                ProjectDuration::from_span(MetricsSource::Filesystem, first, last)
            }
            None => ProjectDuration::empty(MetricsSource::Filesystem, NO_FILES_SUMMARY),
        }
    }

    /// File touches per category across all non-merge commits.
    pub fn git_contribution_metrics(&self, root: &Path) -> CategoryCounts {
        let output = match self.git.run(
            root,
            &["log", "--name-only", "--pretty=format:", "--no-merges", "--all"],
        ) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "git log for metrics failed");
                return CategoryCounts::new();
            }
        };

        let mut counts = CategoryCounts::new();
        for path in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.ignore.matches_path(path) {
                continue;
            }
            *counts.entry(self.classifier.classify(path)).or_insert(0) += 1;
        }
        counts
    }

    /// Current files per category, hidden ones included.
    pub fn filesystem_contribution_metrics(&self, root: &Path) -> CategoryCounts {
        let mut counts = CategoryCounts::new();
        for (_, rel) in self.project_files(root, false) {
            *counts.entry(self.classifier.classify(&rel)).or_insert(0) += 1;
        }
        counts
    }

    /// First strategy with data wins: git inside a work tree, then the filesystem.
    pub fn get_project_duration(&self, root: &Path) -> ProjectDuration {
        let in_repo = self.is_git_repo(root);
        let mut last = None;
        for source in STRATEGIES {
            let result = match source {
                MetricsSource::Git if !in_repo => continue,
                MetricsSource::Git => self.git_project_duration(root),
                MetricsSource::Filesystem => self.filesystem_project_duration(root),
            };
            if result.has_data() {
                return result;
            }
            tracing::debug!(source = ?source, "no duration data, falling through");
            last = Some(result);
        }
        last.unwrap_or_else(|| ProjectDuration::empty(MetricsSource::Filesystem, NO_FILES_SUMMARY))
    }

    /// First strategy with data wins; counts are never merged across sources.
    pub fn get_project_contribution_metrics(&self, root: &Path) -> ContributionMetrics {
        let in_repo = self.is_git_repo(root);
        for source in STRATEGIES {
            let counts = match source {
                MetricsSource::Git if !in_repo => continue,
                MetricsSource::Git => self.git_contribution_metrics(root),
                MetricsSource::Filesystem => self.filesystem_contribution_metrics(root),
            };
            if !counts.is_empty() {
                return ContributionMetrics { counts, source };
            }
            tracing::debug!(source = ?source, "no contribution data, falling through");
        }
        ContributionMetrics {
            counts: CategoryCounts::new(),
            source: MetricsSource::Filesystem,
        }
    }

    /// Files outside ignored directories, with their relative paths.
    ///
    /// With `skip_hidden`, dot-prefixed files and directories are left out too.
    fn project_files(&self, root: &Path, skip_hidden: bool) -> Vec<(PathBuf, String)> {
        let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !(skip_hidden && name.starts_with('.')) && !self.ignore.contains(&name)
        });

        walker
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let rel = relative_posix_path(entry.path(), root)?;
                Some((entry.into_path(), rel))
            })
            .collect()
    }
}

fn span<I: IntoIterator<Item = DateTime<Utc>>>(times: I) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    times.into_iter().fold(None, |acc, t| match acc {
        None => Some((t, t)),
        Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
    })
}

/// Birth time (ctime where unsupported) and modification time.
fn file_times(meta: &Metadata) -> Vec<DateTime<Utc>> {
    let mut times = Vec::with_capacity(2);
    match meta.created() {
        Ok(created) => times.push(DateTime::<Utc>::from(created)),
        Err(_) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;
                if let Some(ctime) = DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32)
                {
                    times.push(ctime);
                }
            }
        }
    }
    if let Ok(modified) = meta.modified() {
        times.push(DateTime::<Utc>::from(modified));
    }
    times
}

/// Renders a duration as `"N days, N hours, N minutes"`, dropping leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days} days"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours} hours"));
    }
    parts.push(format!("{minutes} minutes"));
    parts.join(", ")
}
