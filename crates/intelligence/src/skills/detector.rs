use super::rules::{SkillRule, SKILL_RULES};
use super::SkillSet;
use artimine_discovery::{relative_posix_path, Error, IgnorePatterns, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Walks a project and applies every [`SkillRule`] to every file.
///
/// Only names and paths are inspected; file contents are never read.
#[derive(Debug, Clone)]
pub struct SkillDetector {
    ignore: IgnorePatterns,
    rules: &'static [SkillRule],
}

impl Default for SkillDetector {
    fn default() -> Self {
        Self::new(IgnorePatterns::default())
    }
}

impl SkillDetector {
    pub fn new(ignore: IgnorePatterns) -> Self {
        Self {
            ignore,
            rules: SKILL_RULES,
        }
    }

    /// Replaces the rule table.
    pub fn with_rules(mut self, rules: &'static [SkillRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Detects skills across every non-ignored file under `root`.
    pub fn detect(&self, root: &Path) -> Result<SkillSet> {
        if !root.is_dir() {
            return Err(Error::InvalidDirectory {
                path: root.to_path_buf(),
            });
        }

        let mut skills = SkillSet::new();
        let mut scanned = 0usize;
        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !self.ignore.contains(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_posix_path(entry.path(), root) else {
                continue;
            };
            if self.ignore.matches_path(&rel) {
                continue;
            }
            scanned += 1;
            skills.merge(self.detect_file(&rel));
        }

        tracing::debug!(
            root = %root.display(),
            files = scanned,
            tools = skills.tools.len(),
            practices = skills.practices.len(),
            "skill detection complete"
        );
        Ok(skills)
    }

    /// Skills implied by one `/`-separated relative path.
    pub fn detect_file(&self, rel_path: &str) -> SkillSet {
        let path = rel_path.trim_start_matches('/').to_lowercase();
        let name = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();

        let mut skills = SkillSet::new();
        for rule in self.rules.iter().filter(|r| r.matches(&name, &path)) {
            for label in rule.labels {
                skills.insert(rule.skill_type, label);
            }
        }
        skills
    }
}
