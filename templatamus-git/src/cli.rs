use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use templatamus_core::{
    error::VcsError,
    ports::{ApplyOutcome, CommitOutcome, VersionControl},
    store::{CONFLICT_PATCH_FILE, METADATA_DIR, SYNC_FILE},
};
use walkdir::{DirEntry, WalkDir};

/// Runs the `git` binary found on `PATH` (or an explicit program).
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `git init`, stage everything, and record `message` as the first commit.
    pub fn init_repo(&self, dir: &Path, message: &str) -> Result<(), VcsError> {
        self.git_ok(dir, &["init", "--quiet"])?;
        self.git_ok(dir, &["add", "-A"])?;
        self.git_ok(dir, &["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        tracing::debug!("running git {} in {}", args.join(" "), dir.display());
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(dir);
        cmd
    }

    /// Run and return the raw output regardless of exit status.
    fn git(&self, dir: &Path, args: &[&str]) -> Result<Output, VcsError> {
        self.command(dir, args)
            .output()
            .map_err(|source| VcsError::Spawn {
                command: describe(args),
                source,
            })
    }

    /// Run and return trimmed stdout, or a [`VcsError::Command`].
    fn git_ok(&self, dir: &Path, args: &[&str]) -> Result<String, VcsError> {
        let out = self.git(dir, args)?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).trim_end().to_owned())
        } else {
            Err(command_failed(args, &out))
        }
    }

    /// Run with `input` piped to stdin.
    fn git_with_stdin(&self, dir: &Path, args: &[&str], input: &[u8]) -> Result<Output, VcsError> {
        let spawn_err = |source: std::io::Error| VcsError::Spawn {
            command: describe(args),
            source,
        };
        let mut child = self
            .command(dir, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input).map_err(spawn_err)?;
        }
        child.wait_with_output().map_err(spawn_err)
    }
}

impl VersionControl for GitCli {
    fn apply_patch(&self, dir: &Path, diff: &[u8]) -> Result<ApplyOutcome, VcsError> {
        let args = ["apply", "--reject", "--whitespace=fix", "-"];
        let before = reject_files(dir)?;
        let out = self.git_with_stdin(dir, &args, diff)?;
        if out.status.success() {
            return Ok(ApplyOutcome::Applied);
        }

        let rejects: Vec<PathBuf> = reject_files(dir)?.difference(&before).cloned().collect();
        if rejects.is_empty() {
            return Err(command_failed(&args, &out));
        }
        tracing::debug!("git apply left {} reject file(s)", rejects.len());
        Ok(ApplyOutcome::Conflict { rejects })
    }

    fn commit_changes(&self, dir: &Path, message: &str) -> Result<CommitOutcome, VcsError> {
        // The open-conflict record never enters history.
        let exclude_status = format!(":(exclude){METADATA_DIR}/{SYNC_FILE}");
        let exclude_patch = format!(":(exclude){METADATA_DIR}/{CONFLICT_PATCH_FILE}");
        self.git_ok(dir, &["add", "-A", "--", ".", &exclude_status, &exclude_patch])?;

        // `diff --cached --quiet` exits 0 when the index matches HEAD, 1 when it does not.
        let args = ["diff", "--cached", "--quiet"];
        let out = self.git(dir, &args)?;
        match out.status.code() {
            Some(0) => return Ok(CommitOutcome::NothingToCommit),
            Some(1) => {}
            _ => return Err(command_failed(&args, &out)),
        }

        self.git_ok(dir, &["commit", "--quiet", "-m", message])?;
        Ok(CommitOutcome::Committed)
    }

    fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool, VcsError> {
        let exclude = format!(":(exclude){METADATA_DIR}");
        let status = self.git_ok(dir, &["status", "--porcelain", "--", ".", &exclude])?;
        Ok(!status.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

fn command_failed(args: &[&str], out: &Output) -> VcsError {
    VcsError::Command {
        command: describe(args),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
        exit_code: out.status.code(),
    }
}

/// Every `*.rej` file under `dir`, skipping `.git` and the metadata dir.
fn reject_files(dir: &Path) -> Result<BTreeSet<PathBuf>, VcsError> {
    let mut found = BTreeSet::new();
    let walker = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker {
        let entry = entry.map_err(|e| VcsError::Io {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "rej") {
            found.insert(path.to_path_buf());
        }
    }
    Ok(found)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && (entry.file_name() == ".git" || entry.file_name() == METADATA_DIR)
}
