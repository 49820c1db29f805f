// src/vcs/mod.rs

//! Read-only version-control queries used by the staleness decider.
//!
//! - [`VersionControl`] is the narrow interface the decider depends on.
//! - [`git::GitOracle`] answers it by spawning `git`.
//!
//! Every `Err` returned here means "cannot tell"; callers must treat it as
//! "the output may be stale".

use std::fmt;
use std::path::Path;

use crate::errors::Result;

pub mod git;

pub use git::GitOracle;

/// Identifier of a commit (a full hash for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        CommitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait abstracting the version-control backend.
///
/// Production code uses [`GitOracle`]; tests script the answers instead.
pub trait VersionControl {
    /// Most recent commit touching `path`, or `None` if it has no history.
    fn last_commit(&self, path: &Path) -> Result<Option<CommitId>>;

    /// Whether the working copy of `path` differs from `HEAD`.
    fn is_dirty(&self, path: &Path) -> Result<bool>;

    /// Whether `parent` is reachable from `child` (a commit counts as
    /// reachable from itself).
    fn is_ancestor(&self, parent: &CommitId, child: &CommitId) -> Result<bool>;
}
