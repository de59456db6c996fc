//! Per-author commit statistics from `git shortlog` and `git log --numstat`.

use crate::git::{GitCommand, SystemGit};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const NOREPLY_DOMAIN: &str = "@users.noreply.github.com";
const COMMIT_MARKER: &str = "@@";

/// One line of `git shortlog -sne`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortlogEntry {
    pub name: String,
    pub email: String,
    pub commits: u64,
}

/// One file row of a numstat commit block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub path: String,
    /// Zero for binary files.
    pub added: u64,
    pub deleted: u64,
}

/// One commit from `git log --numstat --pretty=format:@@%an%x09%ae`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitStat {
    pub author: String,
    pub email: String,
    pub files: Vec<FileStat>,
}

/// Aggregated activity of one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorInfo {
    pub name: String,
    pub email: String,
    pub commits: u64,
    pub files_modified: BTreeSet<String>,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl ContributorInfo {
    fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            commits: 0,
            files_modified: BTreeSet::new(),
            lines_added: 0,
            lines_deleted: 0,
        }
    }

    fn absorb(&mut self, other: ContributorInfo) {
        if is_noreply(&self.email) && !is_noreply(&other.email) {
            self.email = other.email;
        }
        self.commits += other.commits;
        self.lines_added += other.lines_added;
        self.lines_deleted += other.lines_deleted;
        self.files_modified.extend(other.files_modified);
    }
}

/// Parses `count<TAB>Name <email>` lines; malformed lines are skipped.
pub fn parse_shortlog(output: &str) -> Vec<ShortlogEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (count, ident) = line.trim().split_once('\t')?;
            let commits = count.trim().parse().ok()?;
            let (name, email) = split_ident(ident);
            Some(ShortlogEntry {
                name,
                email,
                commits,
            })
        })
        .collect()
}

/// Splits `Name <email>`; a missing address yields an empty email.
fn split_ident(ident: &str) -> (String, String) {
    let ident = ident.trim();
    match (ident.rfind('<'), ident.rfind('>')) {
        (Some(open), Some(close)) if open < close => (
            ident[..open].trim().to_string(),
            ident[open + 1..close].trim().to_string(),
        ),
        _ => (ident.to_string(), String::new()),
    }
}

/// Parses the numstat log into commits. Binary rows (`-\t-\tpath`) count as
/// touched with zero lines.
pub fn parse_numstat_log(output: &str) -> Vec<CommitStat> {
    let mut commits: Vec<CommitStat> = Vec::new();
    for line in output.lines() {
        if let Some(header) = line.strip_prefix(COMMIT_MARKER) {
            let (author, email) = header.split_once('\t').unwrap_or((header, ""));
            commits.push(CommitStat {
                author: author.trim().to_string(),
                email: email.trim().to_string(),
                files: Vec::new(),
            });
            continue;
        }
        let Some(current) = commits.last_mut() else {
            continue;
        };
        let mut cols = line.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (cols.next(), cols.next(), cols.next())
        else {
            continue;
        };
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        current.files.push(FileStat {
            path: path.to_string(),
            added: added.trim().parse().unwrap_or(0),
            deleted: deleted.trim().parse().unwrap_or(0),
        });
    }
    commits
}

/// Folds commits into contributors keyed by lower-cased email (name when absent).
pub fn aggregate_commits(commits: Vec<CommitStat>) -> Vec<ContributorInfo> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ContributorInfo> = HashMap::new();
    for commit in commits {
        let key = if commit.email.is_empty() {
            normalize_name(&commit.author)
        } else {
            commit.email.to_lowercase()
        };
        let info = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            ContributorInfo::new(&commit.author, &commit.email)
        });
        info.commits += 1;
        for file in commit.files {
            info.lines_added += file.added;
            info.lines_deleted += file.deleted;
            info.files_modified.insert(file.path);
        }
    }
    let contributors = order
        .into_iter()
        .filter_map(|k| by_key.remove(&k))
        .collect();
    sort_by_commits(contributors)
}

/// Merges contributors whose normalized names match.
///
/// Counts and lines are summed, files unioned, and a real address preferred
/// over a GitHub noreply one.
pub fn merge_duplicates(contributors: Vec<ContributorInfo>) -> Vec<ContributorInfo> {
    let mut merged: Vec<ContributorInfo> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for contributor in contributors {
        let key = normalize_name(&contributor.name);
        match index.get(&key) {
            Some(&i) => merged[i].absorb(contributor),
            None => {
                index.insert(key, merged.len());
                merged.push(contributor);
            }
        }
    }
    sort_by_commits(merged)
}

/// Lower-case with internal whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_noreply(email: &str) -> bool {
    email.to_lowercase().ends_with(NOREPLY_DOMAIN)
}

fn sort_by_commits(mut contributors: Vec<ContributorInfo>) -> Vec<ContributorInfo> {
    contributors.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(&b.name)));
    contributors
}

/// Runs the numstat log and aggregates it.
#[derive(Debug, Clone, Default)]
pub struct ContributorAnalyzer<G = SystemGit> {
    git: G,
}

impl<G: GitCommand> ContributorAnalyzer<G> {
    pub fn new(git: G) -> Self {
        Self { git }
    }

    /// Contributors sorted by commit count; empty when git yields nothing.
    pub fn analyze(&self, root: &Path, merge: bool) -> Vec<ContributorInfo> {
        let output = match self.git.run(
            root,
            &[
                "log",
                "--all",
                "--no-merges",
                "--numstat",
                "--pretty=format:@@%an%x09%ae",
            ],
        ) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "git numstat log failed");
                return Vec::new();
            }
        };
        let contributors = aggregate_commits(parse_numstat_log(&output));
        tracing::debug!(contributors = contributors.len(), merge, "contributors aggregated");
        if merge {
            merge_duplicates(contributors)
        } else {
            contributors
        }
    }

    /// Parsed `git shortlog -sne --all`.
    pub fn shortlog(&self, root: &Path) -> Vec<ShortlogEntry> {
        match self.git.run(root, &["shortlog", "-sne", "--all"]) {
            Ok(out) => parse_shortlog(&out),
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "git shortlog failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::RecordingGit;

    const NUMSTAT: &str = "@@Ana Lima\tana@example.com\n\
10\t2\tsrc/app.py\n\
-\t-\tassets/logo.png\n\
\n\
@@Bo\tbo@example.com\n\
3\t0\tREADME.md\n\
\n\
@@ana lima\t123+ana@users.noreply.github.com\n\
1\t1\tsrc/app.py\n\
4\t0\ttests/test_app.py\n";

    #[test]
    fn shortlog_lines_parse() {
        let entries = parse_shortlog("    12\tAna Lima <ana@example.com>\n     3\tBo <bo@example.com>\nnot a line\n");
        assert_eq!(
            entries,
            vec![
                ShortlogEntry {
                    name: "Ana Lima".into(),
                    email: "ana@example.com".into(),
                    commits: 12
                },
                ShortlogEntry {
                    name: "Bo".into(),
                    email: "bo@example.com".into(),
                    commits: 3
                },
            ]
        );
    }

    #[test]
    fn shortlog_without_email() {
        let entries = parse_shortlog("1\tGitHub\n");
        assert_eq!(entries[0].name, "GitHub");
        assert_eq!(entries[0].email, "");
    }

    #[test]
    fn numstat_blocks_parse_with_binary_rows() {
        let commits = parse_numstat_log(NUMSTAT);
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].author, "Ana Lima");
        assert_eq!(
            commits[0].files[1],
            FileStat {
                path: "assets/logo.png".into(),
                added: 0,
                deleted: 0
            }
        );
        assert_eq!(commits[2].files.len(), 2);
    }

    #[test]
    fn aggregation_keys_by_email() {
        let contributors = aggregate_commits(parse_numstat_log(NUMSTAT));
        assert_eq!(contributors.len(), 3);
        let ana = contributors
            .iter()
            .find(|c| c.email == "ana@example.com")
            .unwrap();
        assert_eq!(ana.commits, 1);
        assert_eq!(ana.lines_added, 10);
        assert_eq!(ana.files_modified.len(), 2);
    }

    #[test]
    fn merge_prefers_real_email_and_sums() {
        let merged = merge_duplicates(aggregate_commits(parse_numstat_log(NUMSTAT)));
        assert_eq!(merged.len(), 2);
        let ana = &merged[0];
        assert_eq!(ana.email, "ana@example.com");
        assert_eq!(ana.commits, 2);
        assert_eq!(ana.lines_added, 15);
        assert_eq!(ana.lines_deleted, 3);
        assert_eq!(
            ana.files_modified.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["assets/logo.png", "src/app.py", "tests/test_app.py"]
        );
    }

    #[test]
    fn merge_upgrades_noreply_seen_first() {
        let mut first = ContributorInfo::new("Cy", "cy@users.noreply.github.com");
        first.commits = 1;
        let mut second = ContributorInfo::new("cy ", "cy@corp.dev");
        second.commits = 1;
        let merged = merge_duplicates(vec![first, second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].email, "cy@corp.dev");
    }

    #[test]
    fn analyzer_returns_empty_on_git_failure() {
        let git = RecordingGit::new().fail("log", "fatal: not a git repository");
        let analyzer = ContributorAnalyzer::new(&git);
        assert!(analyzer.analyze(Path::new("/nowhere"), true).is_empty());
    }

    #[test]
    fn analyzer_merges_on_request() {
        let git = RecordingGit::new().respond("log", NUMSTAT);
        let analyzer = ContributorAnalyzer::new(&git);
        assert_eq!(analyzer.analyze(Path::new("/repo"), false).len(), 3);
        assert_eq!(analyzer.analyze(Path::new("/repo"), true).len(), 2);
    }
}
