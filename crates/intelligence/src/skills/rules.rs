//! Pattern tables for tool and practice detection.
//!
//! Every rule is evaluated against every file; a rule may emit several labels.

use super::SkillType;

/// How a rule's pattern is compared against a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Lower-cased basename equals the pattern.
    ExactName,
    /// Lower-cased basename contains (or ends with) the pattern.
    NameContains,
    /// Lower-cased relative path contains (or starts with) the pattern.
    PathContains,
}

/// One row of the detection table.
#[derive(Debug, Clone, Copy)]
pub struct SkillRule {
    pub pattern: &'static str,
    pub kind: MatchKind,
    pub skill_type: SkillType,
    pub labels: &'static [&'static str],
}

impl SkillRule {
    /// Whether this rule fires for a file. Both inputs must already be lower-cased.
    pub fn matches(&self, name: &str, path: &str) -> bool {
        match self.kind {
            MatchKind::ExactName => name == self.pattern,
            MatchKind::NameContains => name.contains(self.pattern) || name.ends_with(self.pattern),
            MatchKind::PathContains => path.contains(self.pattern) || path.starts_with(self.pattern),
        }
    }
}

const fn tool(pattern: &'static str, kind: MatchKind, labels: &'static [&'static str]) -> SkillRule {
    SkillRule {
        pattern,
        kind,
        skill_type: SkillType::Tool,
        labels,
    }
}

const fn practice(
    pattern: &'static str,
    kind: MatchKind,
    labels: &'static [&'static str],
) -> SkillRule {
    SkillRule {
        pattern,
        kind,
        skill_type: SkillType::Practice,
        labels,
    }
}

use MatchKind::{ExactName, NameContains, PathContains};

pub const TDD: &str = "Test-Driven Development (TDD)";
pub const AUTOMATED_TESTING: &str = "Automated Testing";
pub const CI_CD: &str = "Continuous Integration / Continuous Deployment (CI/CD)";
pub const CODE_REVIEW: &str = "Code Review";
pub const CONTAINERIZATION: &str = "Containerization";
pub const DOCUMENTATION: &str = "Documentation";

/// The full detection table.
pub const SKILL_RULES: &[SkillRule] = &[
    // Tools by exact file name
    tool("pytest.ini", ExactName, &["PyTest"]),
    tool("conftest.py", ExactName, &["PyTest"]),
    tool("dockerfile", ExactName, &["Docker"]),
    tool(".dockerignore", ExactName, &["Docker"]),
    tool("makefile", ExactName, &["Make"]),
    tool("cmakelists.txt", ExactName, &["CMake"]),
    tool("package.json", ExactName, &["npm"]),
    tool("package-lock.json", ExactName, &["npm"]),
    tool("yarn.lock", ExactName, &["Yarn"]),
    tool("pnpm-lock.yaml", ExactName, &["pnpm"]),
    tool("requirements.txt", ExactName, &["pip"]),
    tool("pipfile", ExactName, &["Pipenv"]),
    tool("poetry.lock", ExactName, &["Poetry"]),
    tool("cargo.toml", ExactName, &["Cargo"]),
    tool("pom.xml", ExactName, &["Maven"]),
    tool("build.gradle", ExactName, &["Gradle"]),
    tool("build.gradle.kts", ExactName, &["Gradle"]),
    tool("tox.ini", ExactName, &["tox"]),
    tool("mypy.ini", ExactName, &["mypy"]),
    tool(".flake8", ExactName, &["Flake8"]),
    tool(".pylintrc", ExactName, &["Pylint"]),
    tool("ruff.toml", ExactName, &["Ruff"]),
    tool(".eslintrc", ExactName, &["ESLint"]),
    tool(".eslintrc.json", ExactName, &["ESLint"]),
    tool(".eslintrc.js", ExactName, &["ESLint"]),
    tool("eslint.config.js", ExactName, &["ESLint"]),
    tool(".prettierrc", ExactName, &["Prettier"]),
    tool("tsconfig.json", ExactName, &["TypeScript Compiler"]),
    tool("babel.config.js", ExactName, &["Babel"]),
    tool(".babelrc", ExactName, &["Babel"]),
    tool("webpack.config.js", ExactName, &["Webpack"]),
    tool("vite.config.js", ExactName, &["Vite"]),
    tool("vite.config.ts", ExactName, &["Vite"]),
    tool("jest.config.js", ExactName, &["Jest"]),
    tool("jest.config.ts", ExactName, &["Jest"]),
    tool("vitest.config.ts", ExactName, &["Vitest"]),
    tool("cypress.config.js", ExactName, &["Cypress"]),
    tool("playwright.config.ts", ExactName, &["Playwright"]),
    tool(".travis.yml", ExactName, &["Travis CI"]),
    tool("jenkinsfile", ExactName, &["Jenkins"]),
    tool(".gitlab-ci.yml", ExactName, &["GitLab CI"]),
    tool(".gitignore", ExactName, &["Git"]),
    tool(".gitattributes", ExactName, &["Git"]),
    tool("vagrantfile", ExactName, &["Vagrant"]),
    tool("procfile", ExactName, &["Heroku"]),
    tool("firebase.json", ExactName, &["Firebase"]),
    tool("vercel.json", ExactName, &["Vercel"]),
    tool("netlify.toml", ExactName, &["Netlify"]),
    tool("alembic.ini", ExactName, &["Alembic"]),
    tool("manage.py", ExactName, &["Django Admin"]),
    // Tools by file-name fragment or suffix
    tool("docker-compose", NameContains, &["Docker"]),
    tool(".dockerfile", NameContains, &["Docker"]),
    tool(".sql", NameContains, &["SQL"]),
    tool(".ipynb", NameContains, &["Jupyter Notebook"]),
    tool(".tf", NameContains, &["Terraform"]),
    tool(".proto", NameContains, &["Protocol Buffers"]),
    tool(".graphql", NameContains, &["GraphQL"]),
    tool(".sh", NameContains, &["Bash"]),
    tool(".ps1", NameContains, &["PowerShell"]),
    tool(".sqlite", NameContains, &["SQLite"]),
    tool(".db", NameContains, &["SQLite"]),
    tool(".fig", NameContains, &["Figma"]),
    tool(".sketch", NameContains, &["Sketch"]),
    tool(".psd", NameContains, &["Adobe Photoshop"]),
    tool(".ai", NameContains, &["Adobe Illustrator"]),
    // Tools by path fragment
    tool(".github/workflows", PathContains, &["GitHub Actions"]),
    tool(".circleci", PathContains, &["CircleCI"]),
    tool("k8s/", PathContains, &["Kubernetes"]),
    tool("kubernetes/", PathContains, &["Kubernetes"]),
    tool("helm/", PathContains, &["Helm"]),
    tool("ansible/", PathContains, &["Ansible"]),
    tool(".vscode/", PathContains, &["Visual Studio Code"]),
    tool(".idea/", PathContains, &["JetBrains IDE"]),
    tool(".husky/", PathContains, &["Husky"]),
    // Practices by exact file name
    practice("readme.md", ExactName, &[DOCUMENTATION]),
    practice("readme.rst", ExactName, &[DOCUMENTATION]),
    practice("contributing.md", ExactName, &["Contribution Guidelines"]),
    practice("code_of_conduct.md", ExactName, &["Community Standards"]),
    practice("changelog.md", ExactName, &["Changelog Maintenance"]),
    practice("codeowners", ExactName, &["Code Ownership", CODE_REVIEW]),
    practice("license", ExactName, &["Open Source Licensing"]),
    practice("license.md", ExactName, &["Open Source Licensing"]),
    practice(".editorconfig", ExactName, &["Consistent Code Style"]),
    practice(".prettierrc", ExactName, &["Consistent Code Style"]),
    practice(".pre-commit-config.yaml", ExactName, &["Pre-commit Hooks"]),
    practice(".env.example", ExactName, &["Environment Configuration"]),
    practice("dockerfile", ExactName, &[CONTAINERIZATION]),
    practice("security.md", ExactName, &["Security Policy"]),
    practice("openapi.yaml", ExactName, &["API Design"]),
    practice("openapi.json", ExactName, &["API Design"]),
    practice("swagger.json", ExactName, &["API Design"]),
    // Practices by file-name fragment
    practice("pull_request_template", NameContains, &[CODE_REVIEW]),
    practice("issue_template", NameContains, &["Issue Tracking"]),
    practice("test_", NameContains, &[AUTOMATED_TESTING]),
    practice("_test.", NameContains, &[AUTOMATED_TESTING]),
    practice(".test.", NameContains, &[AUTOMATED_TESTING]),
    practice(".spec.", NameContains, &[AUTOMATED_TESTING]),
    practice("docker-compose", NameContains, &[CONTAINERIZATION]),
    practice(".tf", NameContains, &["Infrastructure as Code"]),
    // Practices by path fragment
    practice("tests/", PathContains, &[TDD, AUTOMATED_TESTING]),
    practice("test/", PathContains, &[TDD, AUTOMATED_TESTING]),
    practice("__tests__/", PathContains, &[TDD, AUTOMATED_TESTING]),
    practice("spec/", PathContains, &[TDD, AUTOMATED_TESTING]),
    practice(".github/workflows", PathContains, &[CI_CD]),
    practice(".circleci", PathContains, &[CI_CD]),
    practice(".github/pull_request_template", PathContains, &[CODE_REVIEW]),
    practice(".github/issue_template", PathContains, &["Issue Tracking"]),
    practice("docs/", PathContains, &[DOCUMENTATION]),
    practice("migrations/", PathContains, &["Database Migrations"]),
    practice("k8s/", PathContains, &["Container Orchestration"]),
    practice("terraform/", PathContains, &["Infrastructure as Code"]),
    practice(".husky/", PathContains, &["Pre-commit Hooks"]),
];
