//! Language and framework detection from manifests and file extensions.

mod dependencies;
mod detector;

pub use dependencies::{
    parse_all_dependencies, parse_cargo_toml, parse_composer_json, parse_gemfile, parse_go_mod,
    parse_package_json, parse_pyproject_toml, parse_requirements_txt,
};
pub use detector::{
    detect_frameworks, detect_language_and_framework, detect_languages, manifest_language,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of [`detect_language_and_framework`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetection {
    /// Dominant language: manifest-decided, else most files by extension.
    pub language: Option<String>,
    /// First detected framework in table order.
    pub framework: Option<String>,
    /// Per-language extension counts.
    pub languages: HashMap<String, LanguageInfo>,
    /// Every detected framework, in table order.
    pub frameworks: Vec<String>,
    /// Parsed dependencies keyed by ecosystem (`rust`, `npm`, `python`, ...).
    pub dependencies: HashMap<String, Vec<DependencyInfo>>,
}

/// Information about a detected programming language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Number of files in this language.
    pub file_count: usize,
    /// Lower-cased extensions seen, in discovery order.
    pub extensions: Vec<String>,
    /// Whether this language has the highest file count.
    pub primary: bool,
}

/// A dependency declared in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub name: String,
    /// Version constraint if one was declared.
    pub version: Option<String>,
    /// Dev, test or build-only dependency.
    pub dev: bool,
}

impl DependencyInfo {
    pub(crate) fn new(name: impl Into<String>, version: Option<String>, dev: bool) -> Self {
        Self {
            name: name.into(),
            version,
            dev,
        }
    }
}
