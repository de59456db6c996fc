//! End-to-end runs of the `artimine` binary.

use artimine_test_utils::ProjectFixture;
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn artimine(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_artimine"))
        .args(args)
        .env("HOME", home)
        .env("ARTIMINE_DB", home.join("db/artimine.db"))
        .env("ARTIMINE_CONFIG", home.join("missing-config.json"))
        .env_remove("ARTIMINE_IGNORE_PATTERNS")
        .env_remove("ARTIMINE_EXTRA_IGNORE")
        .env_remove("ARTIMINE_GIT_TIMEOUT_MS")
        .env_remove("ARTIMINE_CHURN_WINDOW_DAYS")
        .output()
        .expect("run artimine")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "artimine failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn tree_prints_archive_without_ignored_entries() {
    let fixture = ProjectFixture::new().unwrap();
    let zip = fixture
        .write_zip(
            "upload.zip",
            &[
                ("proj/", ""),
                ("proj/main.py", "print(1)"),
                ("proj/.git/config", "[core]"),
                ("proj/tests/test_main.py", ""),
            ],
        )
        .unwrap();

    let output = artimine(fixture.root(), &["tree", zip.to_str().unwrap()]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        text,
        "proj/\n  tests/\n    test_main.py\n  main.py\n(2 files)\n"
    );
}

#[test]
fn tree_rejects_non_zip_input() {
    let fixture = ProjectFixture::with_files(&[("notes.zip", "not an archive")]).unwrap();
    let output = artimine(
        fixture.root(),
        &["tree", fixture.root().join("notes.zip").to_str().unwrap()],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid zip archive"), "stderr: {stderr}");
}

#[test]
fn skills_save_is_idempotent() {
    let fixture = ProjectFixture::with_files(&[
        ("capstone/Dockerfile", "FROM scratch"),
        ("capstone/tests/test_app.py", ""),
    ])
    .unwrap();
    let dir = fixture.root().join("capstone");
    let dir = dir.to_str().unwrap();

    let first = stdout_json(&artimine(fixture.root(), &["skills", dir, "--save"]));
    assert_eq!(first["saved"]["project"], "capstone");
    assert_eq!(first["skills"]["tools"], serde_json::json!(["Docker"]));
    assert!(first["saved"]["report"]["skills_created"].as_u64().unwrap() >= 3);

    let second = stdout_json(&artimine(fixture.root(), &["skills", dir, "--save"]));
    assert_eq!(second["saved"]["project_id"], first["saved"]["project_id"]);
    assert_eq!(second["saved"]["report"]["skills_created"], 0);
    assert_eq!(second["saved"]["report"]["links_created"], 0);
}

#[test]
fn project_flag_requires_save() {
    let fixture = ProjectFixture::new().unwrap();
    let output = artimine(
        fixture.root(),
        &["skills", fixture.root().to_str().unwrap(), "--project", "x"],
    );
    assert!(!output.status.success());
}

#[test]
fn oaci_scores_merged_work_and_reviews() {
    let fixture = ProjectFixture::new().unwrap();
    let input = fixture
        .write(
            "oaci.json",
            r#"{
              "prs": [
                {"id": 1, "author": "ana", "merged": true,
                 "files": [{"path": "a.rs", "added": 100, "deleted": 0}],
                 "created_at": "2024-03-01T00:00:00Z"},
                {"id": 2, "author": "bo", "merged": false,
                 "files": [{"path": "b.rs", "added": 500, "deleted": 0}],
                 "created_at": "2024-03-02T00:00:00Z"}
              ],
              "reviews": [{"pr_id": 1, "reviewer": "cy", "suggestions_accepted": 2}],
              "incidents": [{"resolver": "bo", "severity": 9}]
            }"#,
        )
        .unwrap();

    let json = stdout_json(&artimine(fixture.root(), &["oaci", input.to_str().unwrap()]));
    assert_eq!(json["ana"], 100.0);
    assert_eq!(json["bo"], 50.0);
    let cy = json["cy"].as_f64().unwrap();
    let expected = 1.5 * 2.0 + 0.25 * 101f64.ln();
    assert!((cy - expected).abs() < 1e-9);
}

#[test]
fn analyze_runs_full_pipeline_on_archive() {
    let fixture = ProjectFixture::new().unwrap();
    let zip = fixture
        .write_zip(
            "capstone.zip",
            &[
                ("proj/", ""),
                ("proj/requirements.txt", "django==4.2\n"),
                ("proj/app/views.py", "def index(): pass\n"),
                ("proj/tests/test_views.py", "def test(): pass\n"),
                ("proj/README.md", "# Capstone\n"),
            ],
        )
        .unwrap();

    let json = stdout_json(&artimine(
        fixture.root(),
        &["analyze", zip.to_str().unwrap(), "--save"],
    ));
    assert_eq!(json["tree"]["file_count"], 4);
    assert_eq!(json["summary"]["total_files"], 4);
    assert_eq!(json["detection"]["language"], "Python");
    assert_eq!(json["detection"]["framework"], "Django");
    assert_eq!(json["metrics"]["source"], "filesystem");
    assert_eq!(json["metrics"]["counts"]["test"], 1);
    assert!(json["collaborators"]["count"].as_u64().unwrap() >= 1);
    assert!(json["skills"]["practices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "Automated Testing"));
    assert!(json["saved"]["skills_created"].as_u64().unwrap() > 0);
}
