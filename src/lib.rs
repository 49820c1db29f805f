// src/lib.rs

pub mod cli;
pub mod config;
pub mod decide;
pub mod errors;
pub mod fs;
pub mod generate;
pub mod hash;
pub mod logging;
pub mod store;
pub mod vcs;
pub mod walker;

use std::env;
use std::path::Path;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_or_default};
use crate::errors::{RegenError, Result};
use crate::fs::RealFileSystem;
use crate::generate::{CythonCompiler, Dispatcher};
use crate::vcs::GitOracle;
use crate::walker::{RunSummary, TreeWalker};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (optional `pyxregen.toml`)
/// - the hash store, pinned to the invocation directory
/// - git as the version-control oracle
/// - the Cython compiler behind the dispatcher
/// - the tree walk over `args.root`
pub fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = load_or_default(default_config_path())?;

    // Generation temporarily changes directory; anchor everything that is
    // relative to the invocation directory now.
    let invocation_dir = env::current_dir().map_err(RegenError::IoError)?;
    let store_path = invocation_dir.join(&cfg.store().file);
    debug!(store = ?store_path, root = %args.root, "starting");

    let fs = RealFileSystem;
    let vcs = GitOracle::new();
    let compiler = CythonCompiler::detect(cfg.generator(), &invocation_dir);
    let mut dispatcher = Dispatcher::new(fs, compiler, cfg.template().vars.clone());

    let mut walker = TreeWalker::new(&fs, &vcs, &mut dispatcher, store_path)
        .with_exclude(&cfg.walk().exclude)?;
    walker.run(Path::new(&args.root))
}
