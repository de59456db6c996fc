//! Heuristic skill, language and framework detection over project files.
//!
//! This crate provides:
//! - Table-driven tool and practice detection from file names and paths
//! - Dependency manifest parsing for the common ecosystems
//! - Dominant language and framework selection

pub mod context;
pub mod skills;

pub use context::{
    detect_frameworks, detect_language_and_framework, detect_languages, parse_all_dependencies,
    DependencyInfo, LanguageInfo, ProjectDetection,
};
pub use skills::{MatchKind, Skill, SkillDetector, SkillRule, SkillSet, SkillType, SKILL_RULES};
