// src/decide.rs

//! Staleness decision for one (source, output) pair.
//!
//! The protocol, in order:
//!
//! 1. Hash the source and (if present) the output.
//! 2. If that pair equals the stored one, nothing changed: not stale, and no
//!    version-control query is made at all.
//! 3. Otherwise ask version control for the last commit of each file.
//! 4. If both are committed, the source has no local edits, and the source's
//!    commit is reachable from the output's, the output was committed after
//!    its source: not stale, and the stored pair is refreshed.
//! 5. Anything else, including any failed query, is stale.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::hash::{DigestPair, digest_pair};
use crate::store::HashStore;
use crate::vcs::VersionControl;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Digests match the stored pair.
    Unchanged,
    /// Output commit descends from the source commit and the source is clean.
    CommittedAfterSource,
    SourceUntracked,
    OutputUntracked,
    SourceDirty,
    OutputPredatesSource,
    /// A VCS query failed, so freshness could not be confirmed.
    VcsIndeterminate,
}

impl Reason {
    pub fn is_stale(self) -> bool {
        !matches!(self, Reason::Unchanged | Reason::CommittedAfterSource)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Unchanged => "unchanged since last run",
            Reason::CommittedAfterSource => "output committed after source",
            Reason::SourceUntracked => "source has no commit history",
            Reason::OutputUntracked => "output has no commit history",
            Reason::SourceDirty => "source has uncommitted changes",
            Reason::OutputPredatesSource => "output not committed after source",
            Reason::VcsIndeterminate => "version control state indeterminate",
        };
        f.write_str(text)
    }
}

/// Outcome of [`needs_regeneration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub stale: bool,
    /// Pair to record in the store, when the decision itself warrants it
    /// (only the version-control short-circuit does; regeneration records
    /// the post-generation pair instead).
    pub updated_entry: Option<DigestPair>,
    pub reason: Reason,
}

impl Decision {
    fn fresh(reason: Reason, updated_entry: Option<DigestPair>) -> Self {
        Self {
            stale: false,
            updated_entry,
            reason,
        }
    }

    fn stale(reason: Reason) -> Self {
        Self {
            stale: true,
            updated_entry: None,
            reason,
        }
    }
}

/// Decide whether `output` must be regenerated from `source`.
///
/// Only hashing errors propagate; version-control failures are logged and
/// resolved as stale.
pub fn needs_regeneration(
    fs: &dyn FileSystem,
    vcs: &dyn VersionControl,
    source: &Path,
    output: &Path,
    store: &HashStore,
) -> Result<Decision> {
    let current = digest_pair(fs, source, output)?;

    if store.get(source) == Some(&current) {
        debug!(source = ?source, "digests match stored entry");
        return Ok(Decision::fresh(Reason::Unchanged, None));
    }

    let reason = match consult_vcs(vcs, source, output) {
        Ok(reason) => reason,
        Err(err) => {
            warn!(source = ?source, error = %err, "cannot confirm freshness from version control; assuming stale");
            Reason::VcsIndeterminate
        }
    };

    if reason.is_stale() {
        Ok(Decision::stale(reason))
    } else {
        Ok(Decision::fresh(reason, Some(current)))
    }
}

fn consult_vcs(vcs: &dyn VersionControl, source: &Path, output: &Path) -> Result<Reason> {
    let Some(from) = vcs.last_commit(source)? else {
        return Ok(Reason::SourceUntracked);
    };
    let Some(to) = vcs.last_commit(output)? else {
        return Ok(Reason::OutputUntracked);
    };
    debug!(source = ?source, source_commit = %from, output_commit = %to, "consulting version control");

    if vcs.is_dirty(source)? {
        return Ok(Reason::SourceDirty);
    }
    if vcs.is_ancestor(&from, &to)? {
        Ok(Reason::CommittedAfterSource)
    } else {
        Ok(Reason::OutputPredatesSource)
    }
}
