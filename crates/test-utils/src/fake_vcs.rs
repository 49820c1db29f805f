use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use pyxregen::errors::{RegenError, Result};
use pyxregen::vcs::{CommitId, VersionControl};

/// Scriptable in-memory version-control backend.
///
/// - `commit` adds a commit with its parents (forming a DAG).
/// - `track` records the last commit touching a path.
/// - `set_dirty` marks a path as locally modified.
/// - `fail_*` make the corresponding query return `RegenError::Vcs`.
///
/// Every query bumps a counter so tests can assert that none were made.
#[derive(Debug, Default)]
pub struct FakeVcs {
    parents: RefCell<HashMap<String, Vec<String>>>,
    last_commits: RefCell<HashMap<PathBuf, String>>,
    dirty: RefCell<HashSet<PathBuf>>,
    fail_last_commit: Cell<bool>,
    fail_dirty: Cell<bool>,
    fail_ancestry: Cell<bool>,
    queries: Cell<usize>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&self, id: &str, parents: &[&str]) -> &Self {
        self.parents.borrow_mut().insert(
            id.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn track(&self, path: impl AsRef<Path>, commit: &str) -> &Self {
        self.last_commits
            .borrow_mut()
            .insert(path.as_ref().to_path_buf(), commit.to_string());
        self
    }

    pub fn set_dirty(&self, path: impl AsRef<Path>) -> &Self {
        self.dirty.borrow_mut().insert(path.as_ref().to_path_buf());
        self
    }

    pub fn fail_last_commit(&self) -> &Self {
        self.fail_last_commit.set(true);
        self
    }

    pub fn fail_dirty_checks(&self) -> &Self {
        self.fail_dirty.set(true);
        self
    }

    pub fn fail_ancestry_checks(&self) -> &Self {
        self.fail_ancestry.set(true);
        self
    }

    /// Number of queries answered (or failed) so far.
    pub fn queries(&self) -> usize {
        self.queries.get()
    }

    fn bump(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn reachable(&self, from: &str, target: &str) -> bool {
        let parents = self.parents.borrow();
        let mut stack = vec![from.to_string()];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(ps) = parents.get(&id) {
                stack.extend(ps.iter().cloned());
            }
        }
        false
    }
}

impl VersionControl for FakeVcs {
    fn last_commit(&self, path: &Path) -> Result<Option<CommitId>> {
        self.bump();
        if self.fail_last_commit.get() {
            return Err(RegenError::Vcs("scripted log failure".to_string()));
        }
        Ok(self
            .last_commits
            .borrow()
            .get(path)
            .map(|id| CommitId::new(id.clone())))
    }

    fn is_dirty(&self, path: &Path) -> Result<bool> {
        self.bump();
        if self.fail_dirty.get() {
            return Err(RegenError::Vcs("scripted diff failure".to_string()));
        }
        Ok(self.dirty.borrow().contains(path))
    }

    fn is_ancestor(&self, parent: &CommitId, child: &CommitId) -> Result<bool> {
        self.bump();
        if self.fail_ancestry.get() {
            return Err(RegenError::Vcs("scripted rev-list failure".to_string()));
        }
        Ok(self.reachable(child.as_str(), parent.as_str()))
    }
}
