// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::Parser;

/// Root scanned when no directory is given on the command line.
pub const DEFAULT_ROOT: &str = "nipy";

/// Command-line arguments for `pyxregen`.
///
/// Only the root is taken from the command line; everything else lives in
/// the optional `pyxregen.toml` (see [`crate::config`]).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pyxregen",
    version,
    about = "Regenerate C sources from .pyx / .pyx.in files that changed since the last run.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to scan recursively for `.pyx` and `.pyx.in` files.
    #[arg(value_name = "ROOT", default_value = DEFAULT_ROOT)]
    pub root: String,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
