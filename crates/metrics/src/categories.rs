//! Path-based file categories.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Coarse kind of a file, decided from its path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Code,
    Test,
    Design,
    Document,
    Data,
    Devops,
    Other,
}

impl FileCategory {
    pub const ALL: [FileCategory; 7] = [
        FileCategory::Code,
        FileCategory::Test,
        FileCategory::Design,
        FileCategory::Document,
        FileCategory::Data,
        FileCategory::Devops,
        FileCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Code => "code",
            FileCategory::Test => "test",
            FileCategory::Design => "design",
            FileCategory::Document => "document",
            FileCategory::Data => "data",
            FileCategory::Devops => "devops",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Touch or file counts per category.
pub type CategoryCounts = BTreeMap<FileCategory, u64>;

/// Category patterns in evaluation order; the first category with a hit wins.
pub const DEFAULT_CATEGORY_PATTERNS: &[(FileCategory, &[&str])] = &[
    (
        FileCategory::Test,
        &[
            r"(^|/)tests?/",
            r"(^|/)test_",
            r"_test\.",
            r"\.test\.",
            r"\.spec\.",
            r"(^|/)__tests__/",
        ],
    ),
    (
        FileCategory::Code,
        &[
            r"\.(py|js|jsx|ts|tsx|mjs|cjs|java|kt|kts|c|h|cpp|cc|cxx|hpp|cs|go|rs|rb|php|swift|scala|dart|r|jl|lua|ex|exs|hs|m|mm|sh|vue|svelte|html|css|scss)$",
        ],
    ),
    (
        FileCategory::Design,
        &[
            r"\.(fig|sketch|xd|psd|ai|svg|png|jpe?g|gif)$",
            r"(^|/)(design|designs|mockups?|wireframes?)/",
        ],
    ),
    (
        FileCategory::Document,
        &[
            r"\.(md|rst|txt|pdf|docx?|odt|tex|pptx?)$",
            r"(^|/)docs?/",
            r"(^|/)readme",
        ],
    ),
    (
        FileCategory::Data,
        &[
            r"\.(csv|json|xml|sql|db|sqlite3?|parquet|xlsx?|tsv)$",
            r"(^|/)data/",
        ],
    ),
    (
        FileCategory::Devops,
        &[
            r"(^|/)dockerfile",
            r"docker-compose",
            r"(^|/)\.github/workflows/",
            r"(^|/)jenkinsfile$",
            r"\.gitlab-ci\.ya?ml$",
            r"(^|/)makefile$",
            r"\.tf$",
            r"(^|/)k8s/",
            r"(^|/)helm/",
        ],
    ),
];

static DEFAULT_CLASSIFIER: LazyLock<CategoryClassifier> = LazyLock::new(|| {
    CategoryClassifier::new(DEFAULT_CATEGORY_PATTERNS).expect("Invalid regex pattern")
});

/// Compiled category patterns.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<(FileCategory, Regex)>,
}

impl CategoryClassifier {
    /// Compiles each category's patterns into one case-insensitive alternation.
    pub fn new(patterns: &[(FileCategory, &[&str])]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|(category, pats)| {
                let joined = pats
                    .iter()
                    .map(|p| format!("(?:{p})"))
                    .collect::<Vec<_>>()
                    .join("|");
                RegexBuilder::new(&joined)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (*category, re))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn classify(&self, path: &str) -> FileCategory {
        let path = path.replace('\\', "/");
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&path))
            .map(|(category, _)| *category)
            .unwrap_or(FileCategory::Other)
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

/// Classifies `path` with the default patterns.
pub fn classify_path(path: &str) -> FileCategory {
    DEFAULT_CLASSIFIER.classify(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tests_win_over_code() {
        assert_eq!(classify_path("tests/test_api.py"), FileCategory::Test);
        assert_eq!(classify_path("src/app.test.ts"), FileCategory::Test);
        assert_eq!(classify_path("pkg/handler_test.go"), FileCategory::Test);
        assert_eq!(classify_path("web/__tests__/App.jsx"), FileCategory::Test);
    }

    #[test]
    fn each_category_has_a_representative() {
        assert_eq!(classify_path("src/main.rs"), FileCategory::Code);
        assert_eq!(classify_path("assets/logo.PNG"), FileCategory::Design);
        assert_eq!(classify_path("README"), FileCategory::Document);
        assert_eq!(classify_path("docs/guide.md"), FileCategory::Document);
        assert_eq!(classify_path("seed/users.csv"), FileCategory::Data);
        assert_eq!(classify_path("Dockerfile"), FileCategory::Devops);
        assert_eq!(classify_path(".github/workflows/ci.yml"), FileCategory::Devops);
        assert_eq!(classify_path("LICENSE"), FileCategory::Other);
    }

    #[test]
    fn yaml_is_not_data() {
        assert_eq!(classify_path("config/settings.yaml"), FileCategory::Other);
    }

    #[test]
    fn custom_patterns_are_data() {
        const YAML_AS_DATA: &[(FileCategory, &[&str])] = &[(FileCategory::Data, &[r"\.ya?ml$"])];
        let classifier = CategoryClassifier::new(YAML_AS_DATA).unwrap();
        assert_eq!(classifier.classify("config/settings.yaml"), FileCategory::Data);
        assert_eq!(classifier.classify("src/main.rs"), FileCategory::Other);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        const BROKEN: &[(FileCategory, &[&str])] = &[(FileCategory::Code, &["("])];
        assert!(CategoryClassifier::new(BROKEN).is_err());
    }
}
