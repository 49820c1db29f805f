// src/walker.rs

//! Tree traversal: find sources, decide, regenerate, persist.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};

use crate::decide::needs_regeneration;
use crate::errors::{RegenError, Result};
use crate::fs::FileSystem;
use crate::generate::{Generator, SourceFile};
use crate::hash::digest_pair;
use crate::store::HashStore;
use crate::vcs::VersionControl;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Source files matched by a rule.
    pub scanned: usize,
    pub regenerated: usize,
    /// Fast path: digests matched the store.
    pub unchanged: usize,
    /// Digests differed but version history showed the output is current.
    pub vcs_up_to_date: usize,
}

/// Drives the decider and generator over every source below a root.
///
/// The walker owns the [`HashStore`] for the duration of the run and writes
/// it back to `store_path` after every file, so an interrupted run keeps all
/// completed decisions.
pub struct TreeWalker<'a> {
    fs: &'a dyn FileSystem,
    vcs: &'a dyn VersionControl,
    generator: &'a mut dyn Generator,
    store: HashStore,
    store_path: PathBuf,
    exclude: Option<GlobSet>,
}

impl<'a> TreeWalker<'a> {
    /// Create a walker, loading the store from `store_path`.
    pub fn new(
        fs: &'a dyn FileSystem,
        vcs: &'a dyn VersionControl,
        generator: &'a mut dyn Generator,
        store_path: impl Into<PathBuf>,
    ) -> Self {
        let store_path = store_path.into();
        let store = HashStore::load(fs, &store_path);
        Self {
            fs,
            vcs,
            generator,
            store,
            store_path,
            exclude: None,
        }
    }

    /// Skip paths (relative to the scan root) matching any of `patterns`.
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = build_exclude_set(patterns)?;
        Ok(self)
    }

    pub fn store(&self) -> &HashStore {
        &self.store
    }

    /// Process every source below `root`.
    pub fn run(&mut self, root: &Path) -> Result<RunSummary> {
        let sources = collect_sources(self.fs, root, self.exclude.as_ref())?;
        info!(root = ?root, sources = sources.len(), "scanning");

        let mut summary = RunSummary::default();
        for source in &sources {
            summary.scanned += 1;
            self.process(source, &mut summary)?;
            self.store.save(self.fs, &self.store_path)?;
        }

        info!(
            scanned = summary.scanned,
            regenerated = summary.regenerated,
            unchanged = summary.unchanged,
            vcs_up_to_date = summary.vcs_up_to_date,
            "run complete"
        );
        Ok(summary)
    }

    fn process(&mut self, source: &SourceFile, summary: &mut RunSummary) -> Result<()> {
        let output = source.output_path();
        let decision =
            needs_regeneration(self.fs, self.vcs, source.path(), &output, &self.store)?;

        if !decision.stale {
            match decision.updated_entry {
                Some(entry) => {
                    info!(source = ?source.path(), reason = %decision.reason, "up to date");
                    self.store.insert(source.path(), entry);
                    summary.vcs_up_to_date += 1;
                }
                None => {
                    debug!(source = ?source.path(), reason = %decision.reason, "up to date");
                    summary.unchanged += 1;
                }
            }
            return Ok(());
        }

        info!(source = ?source.path(), reason = %decision.reason, "stale");
        self.generator.generate(source)?;

        // The output just changed, so the recorded pair is the post-generation one.
        let pair = digest_pair(self.fs, source.path(), &output)?;
        self.store.insert(source.path(), pair);

        if let Some(intermediate) = source.intermediate_path() {
            if self.fs.is_file(&intermediate) {
                let pair = digest_pair(self.fs, &intermediate, &output)?;
                self.store.insert(&intermediate, pair);
            }
        }

        summary.regenerated += 1;
        Ok(())
    }
}

fn build_exclude_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build().context("building exclude globset")?))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Find every file below `root` that matches a rule, sorted by path.
///
/// Hidden directories (`.git`, `.tox`, ...) and symlinked directories are
/// never entered; `root` itself may be a link.
pub fn collect_sources(
    fs: &dyn FileSystem,
    root: &Path,
    exclude: Option<&GlobSet>,
) -> Result<Vec<SourceFile>> {
    if !fs.is_dir(root) {
        return Err(RegenError::io(
            root,
            io::Error::new(io::ErrorKind::NotFound, "root directory does not exist"),
        ));
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if let (Some(set), Ok(rel)) = (exclude, path.strip_prefix(root)) {
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if set.is_match(&rel_str) {
                    debug!(path = ?path, "excluded");
                    continue;
                }
            }

            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(path = ?path, "not following directory symlink");
                } else if !is_hidden(&path) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                if let Some(source) = SourceFile::from_path(path) {
                    files.push(source);
                }
            }
        }
    }

    files.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(files)
}
