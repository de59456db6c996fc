//! End-to-end detection over a realistic extracted project.

use artimine_discovery::IgnorePatterns;
use artimine_intelligence::{detect_language_and_framework, SkillDetector, SkillType};
use artimine_test_utils::ProjectFixture;

fn sample_project() -> ProjectFixture {
    ProjectFixture::with_files(&[
        ("proj/pyproject.toml", "[project]\ndependencies = [\"flask>=3\", \"sqlalchemy\"]\n"),
        ("proj/app/__init__.py", ""),
        ("proj/app/routes.py", "from flask import Flask"),
        ("proj/tests/test_routes.py", "def test_ok(): pass"),
        ("proj/pytest.ini", "[pytest]"),
        ("proj/Dockerfile", "FROM python:3.12"),
        ("proj/.github/workflows/ci.yml", "on: push"),
        ("proj/.github/pull_request_template.md", "## Summary"),
        ("proj/migrations/001_init.sql", "create table t();"),
        ("proj/.git/HEAD", "ref: refs/heads/main"),
        ("proj/.venv/lib/site.py", ""),
        ("proj/README.md", "# demo"),
    ])
    .unwrap()
}

#[test]
fn skills_cover_tools_and_practices() {
    let fixture = sample_project();
    let skills = SkillDetector::default().detect(fixture.root()).unwrap();

    for tool in ["PyTest", "Docker", "GitHub Actions", "SQL"] {
        assert!(skills.contains(SkillType::Tool, tool), "missing tool {tool}");
    }
    for practice in [
        "Test-Driven Development (TDD)",
        "Automated Testing",
        "Code Review",
        "Documentation",
        "Database Migrations",
    ] {
        assert!(
            skills.contains(SkillType::Practice, practice),
            "missing practice {practice}"
        );
    }
}

#[test]
fn plain_python_project_yields_testing_practices_and_no_tools() {
    let fixture = ProjectFixture::with_files(&[
        ("proj/main.py", "print('hi')"),
        ("proj/tests/test_a.py", "def test_a(): pass"),
        ("proj/.git/config", "[core]"),
        ("proj/node_modules/x.js", "module.exports = 1"),
    ])
    .unwrap();
    let skills = SkillDetector::default().detect(fixture.root()).unwrap();

    assert!(skills.tools.is_empty(), "unexpected tools {:?}", skills.tools);
    assert!(skills.contains(SkillType::Practice, "Test-Driven Development (TDD)"));
    assert!(skills.contains(SkillType::Practice, "Automated Testing"));
}

#[test]
fn detection_is_stable_across_runs() {
    let fixture = sample_project();
    let detector = SkillDetector::default();
    let first = detector.detect(fixture.root()).unwrap();
    let second = detector.detect(fixture.root()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn language_and_framework_from_nested_manifest() {
    let fixture = sample_project();
    let detection =
        detect_language_and_framework(fixture.root(), &IgnorePatterns::default()).unwrap();
    assert_eq!(detection.language.as_deref(), Some("Python"));
    assert_eq!(detection.framework.as_deref(), Some("Flask"));
    assert_eq!(detection.languages["Python"].file_count, 3);
    assert!(detection.dependencies.contains_key("python"));
}
