//! File-name and path heuristics for tools and engineering practices.

mod detector;
pub mod rules;

pub use detector::SkillDetector;
pub use rules::{MatchKind, SkillRule, SKILL_RULES};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether a skill names a concrete tool or a working practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Tool,
    Practice,
}

impl SkillType {
    /// Stable lowercase label, also used as the persisted column value.
    pub fn as_str(self) -> &'static str {
        match self {
            SkillType::Tool => "tool",
            SkillType::Practice => "practice",
        }
    }

    /// Inverse of [`SkillType::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tool" => Some(SkillType::Tool),
            "practice" => Some(SkillType::Practice),
            _ => None,
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected skill.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub skill_type: SkillType,
}

/// Deduplicated tools and practices found in a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    pub tools: BTreeSet<String>,
    pub practices: BTreeSet<String>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` under `skill_type`; duplicates collapse.
    pub fn insert(&mut self, skill_type: SkillType, name: &str) {
        let bucket = match skill_type {
            SkillType::Tool => &mut self.tools,
            SkillType::Practice => &mut self.practices,
        };
        if !bucket.contains(name) {
            bucket.insert(name.to_string());
        }
    }

    /// Union of two sets.
    pub fn merge(&mut self, other: SkillSet) {
        self.tools.extend(other.tools);
        self.practices.extend(other.practices);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.practices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len() + self.practices.len()
    }

    pub fn contains(&self, skill_type: SkillType, name: &str) -> bool {
        match skill_type {
            SkillType::Tool => self.tools.contains(name),
            SkillType::Practice => self.practices.contains(name),
        }
    }

    /// Iterates tools first, then practices, each alphabetical.
    pub fn iter(&self) -> impl Iterator<Item = Skill> + '_ {
        let tools = self.tools.iter().map(|name| Skill {
            name: name.clone(),
            skill_type: SkillType::Tool,
        });
        let practices = self.practices.iter().map(|name| Skill {
            name: name.clone(),
            skill_type: SkillType::Practice,
        });
        tools.chain(practices)
    }

    /// Flattens into a list of [`Skill`]s.
    pub fn into_skills(self) -> Vec<Skill> {
        self.iter().collect()
    }
}

impl FromIterator<Skill> for SkillSet {
    fn from_iter<I: IntoIterator<Item = Skill>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill.skill_type, &skill.name);
        }
        set
    }
}
