// src/vcs/git.rs

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use super::{CommitId, VersionControl};
use crate::errors::{RegenError, Result};

/// [`VersionControl`] backed by the `git` command line.
///
/// Paths are passed to git as given, so they are interpreted relative to
/// `workdir` (the inherited working directory when unset).
#[derive(Debug, Clone)]
pub struct GitOracle {
    program: String,
    workdir: Option<PathBuf>,
}

impl Default for GitOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOracle {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
            workdir: None,
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run every query from `dir` instead of the inherited working directory.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        debug!(cmd = ?cmd, "running git query");
        cmd.output()
            .map_err(|e| RegenError::Vcs(format!("failed to execute {}: {e}", self.program)))
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl VersionControl for GitOracle {
    fn last_commit(&self, path: &Path) -> Result<Option<CommitId>> {
        let output = self.run([
            OsStr::new("log"),
            OsStr::new("-1"),
            OsStr::new("--format=%H"),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;

        if !output.status.success() {
            // Not a repository, or git refuses to answer for this path.
            debug!(path = ?path, stderr = %stderr_of(&output), "git log failed; treating path as untracked");
            return Ok(None);
        }

        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if sha.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CommitId::new(sha)))
        }
    }

    fn is_dirty(&self, path: &Path) -> Result<bool> {
        let output = self.run([
            OsStr::new("diff"),
            OsStr::new("--quiet"),
            OsStr::new("HEAD"),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;

        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(RegenError::Vcs(format!(
                "git diff for {:?} exited with {:?}: {}",
                path,
                code,
                stderr_of(&output)
            ))),
        }
    }

    fn is_ancestor(&self, parent: &CommitId, child: &CommitId) -> Result<bool> {
        // Everything reachable from `child` but not from `parent`'s parents.
        // `parent` is in that set exactly when it is reachable from `child`.
        let exclude = format!("^{}^@", parent.as_str());
        let output = self.run(["rev-list", child.as_str(), exclude.as_str()])?;

        if !output.status.success() {
            return Err(RegenError::Vcs(format!(
                "git rev-list {child} ^{parent}^@ failed: {}",
                stderr_of(&output)
            )));
        }

        let listed = String::from_utf8_lossy(&output.stdout);
        Ok(listed.lines().any(|line| line.trim() == parent.as_str()))
    }
}
