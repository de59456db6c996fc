//! Blocking `git` subprocess runner.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default timeout for a single git invocation (60 seconds).
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors raised while running git.
///
/// Metric engines treat every variant as "no data" and fall through to the
/// next strategy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GitError {
    /// The git binary could not be started.
    #[error("failed to spawn git: {0}")]
    SpawnFailed(#[source] io::Error),

    /// git exited with a non-zero status.
    #[error("git exited with code {exit_code:?}: {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// git did not finish in time and was killed.
    #[error("git timed out after {0:?}")]
    TimedOut(Duration),

    /// Waiting on or reading from the child failed.
    #[error("failed to wait for git: {0}")]
    WaitFailed(#[source] io::Error),
}

/// Runs git commands against a working directory.
pub trait GitCommand {
    /// Runs `git -C <root> <args..>` and returns stdout.
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, GitError>;

    /// Whether `root` is inside a git work tree.
    fn is_work_tree(&self, root: &Path) -> bool {
        match self.run(root, &["rev-parse", "--is-inside-work-tree"]) {
            Ok(out) => out.trim() == "true",
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "not a git work tree");
                false
            }
        }
    }
}

impl<G: GitCommand + ?Sized> GitCommand for &G {
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, GitError> {
        (**self).run(root, args)
    }
}

/// The system `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: String,
    timeout: Option<Duration>,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: Some(DEFAULT_GIT_TIMEOUT),
        }
    }
}

impl SystemGit {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Uses a different executable; mainly for tests.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl GitCommand for SystemGit {
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, GitError> {
        let mut child = Command::new(&self.binary)
            .arg("-C")
            .arg(root)
            // Keep non-ASCII paths verbatim instead of octal-escaped and quoted.
            .args(["-c", "core.quotePath=false"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(GitError::SpawnFailed)?;

        // Drain both pipes off-thread so a chatty child cannot block on a full pipe.
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match self.timeout {
            None => child.wait().map_err(GitError::WaitFailed)?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    if let Some(status) = child.try_wait().map_err(GitError::WaitFailed)? {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        if let Err(kill_err) = child.kill() {
                            tracing::warn!(error = %kill_err, "failed to kill timed-out git");
                        }
                        let _ = child.wait();
                        tracing::debug!(?args, timeout = ?limit, "git timed out");
                        return Err(GitError::TimedOut(limit));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = join_reader(stdout)?;
        if !status.success() {
            let stderr = join_reader(stderr).unwrap_or_default();
            return Err(GitError::ProcessFailed {
                exit_code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

type Reader = thread::JoinHandle<io::Result<Vec<u8>>>;

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Reader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(reader: Option<Reader>) -> Result<String, GitError> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .map_err(|_| GitError::WaitFailed(io::Error::other("pipe reader panicked")))?
        .map_err(GitError::WaitFailed)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// A canned-response runner that records every invocation.
///
/// Responses are matched on the first argument (`log`, `shortlog`, ...).
#[derive(Debug, Default)]
pub struct RecordingGit {
    responses: Vec<(String, Result<String, String>)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `subcommand` with `stdout`.
    pub fn respond(mut self, subcommand: &str, stdout: &str) -> Self {
        self.responses
            .push((subcommand.to_string(), Ok(stdout.to_string())));
        self
    }

    /// Makes `subcommand` fail with a non-zero exit.
    pub fn fail(mut self, subcommand: &str, stderr: &str) -> Self {
        self.responses
            .push((subcommand.to_string(), Err(stderr.to_string())));
        self
    }

    /// Every argument list seen so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Whether any call used `subcommand` as its first argument.
    pub fn was_called(&self, subcommand: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.first().map(String::as_str) == Some(subcommand))
    }
}

impl GitCommand for RecordingGit {
    fn run(&self, _root: &Path, args: &[&str]) -> Result<String, GitError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.iter().map(|a| a.to_string()).collect());
        }
        let sub = args.first().copied().unwrap_or_default();
        match self.responses.iter().find(|(s, _)| s == sub) {
            Some((_, Ok(out))) => Ok(out.clone()),
            Some((_, Err(stderr))) => Err(GitError::ProcessFailed {
                exit_code: Some(128),
                stderr: stderr.clone(),
            }),
            None => Err(GitError::ProcessFailed {
                exit_code: Some(1),
                stderr: format!("no canned response for {sub}"),
            }),
        }
    }
}
