//! Shared test utilities for artimine crates.
//!
//! This crate provides project fixtures, git repository helpers and
//! environment guards used across the artimine workspace.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = artimine_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// A throwaway project directory.
///
/// The tempdir is removed when the fixture is dropped.
pub struct ProjectFixture {
    pub tempdir: tempfile::TempDir,
}

impl ProjectFixture {
    /// Creates an empty project directory.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            tempdir: tempfile::tempdir()?,
        })
    }

    /// Creates a project containing each `(relative path, body)` pair.
    pub fn with_files(files: &[(&str, &str)]) -> std::io::Result<Self> {
        let fixture = Self::new()?;
        for (rel, body) in files {
            fixture.write(rel, body)?;
        }
        Ok(fixture)
    }

    /// Root of the project.
    pub fn root(&self) -> &Path {
        self.tempdir.path()
    }

    /// Writes `body` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, body: &str) -> std::io::Result<PathBuf> {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        Ok(path)
    }

    /// Writes a ZIP archive with the given entries and returns its path.
    ///
    /// Entry names ending in `/` are added as directories.
    pub fn write_zip(&self, rel: &str, entries: &[(&str, &str)]) -> std::io::Result<PathBuf> {
        let path = self.root().join(rel);
        let file = std::fs::File::create(&path)?;
        let mut writer = zip::ZipWriter::new(file);
        let opts = zip::write::SimpleFileOptions::default();
        for (name, body) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, opts).map_err(std::io::Error::other)?;
            } else {
                writer.start_file(*name, opts).map_err(std::io::Error::other)?;
                writer.write_all(body.as_bytes())?;
            }
        }
        writer.finish().map_err(std::io::Error::other)?;
        Ok(path)
    }
}

/// Runs `git` in `root` with a fixed committer identity, panicking on failure.
pub fn run_git(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("run git command");
    assert!(
        output.status.success(),
        "git command failed: {:?}: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Initializes an empty repository in `root`.
pub fn init_repo(root: &Path) {
    run_git(root, &["init", "-q"]);
    run_git(root, &["config", "user.name", "Test User"]);
    run_git(root, &["config", "user.email", "test@example.com"]);
    run_git(root, &["config", "commit.gpgsign", "false"]);
}

/// A commit to create with [`commit_files`].
pub struct TestCommit<'a> {
    pub author: &'a str,
    pub email: &'a str,
    /// ISO-8601 author date, e.g. `2024-01-15T10:00:00+00:00`.
    pub date: &'a str,
    pub message: &'a str,
    pub files: &'a [(&'a str, &'a str)],
}

/// Writes the files of `commit` and commits them with the given author and date.
pub fn commit_files(root: &Path, commit: &TestCommit<'_>) {
    for (rel, body) in commit.files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, body).expect("write file");
        run_git(root, &["add", rel]);
    }
    let author = format!("{} <{}>", commit.author, commit.email);
    let status = Command::new("git")
        .args(["commit", "-q", "-m", commit.message, "--author", &author])
        .current_dir(root)
        .env("GIT_AUTHOR_DATE", commit.date)
        .env("GIT_COMMITTER_DATE", commit.date)
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("run git commit");
    assert!(status.success(), "git commit failed: {}", commit.message);
}
