// src/generate/compiler.rs

//! External compiler invocation.
//!
//! The dispatcher talks to a [`CompilerBackend`] rather than spawning
//! processes itself, so tests can substitute a backend that records calls
//! and writes outputs directly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{FastFailMode, GeneratorSection};
use crate::errors::{RegenError, Result};

/// Trait abstracting how a single source is compiled.
///
/// Both names are bare file names; the implementation is invoked with the
/// process working directory already set to the source's directory.
pub trait CompilerBackend {
    fn compile(&mut self, source_name: &str, output_name: &str) -> Result<()>;
}

/// A dotted numeric version such as `0.29.36`, compared component-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct ToolVersion(Vec<u64>);

impl ToolVersion {
    pub fn new(mut parts: Vec<u64>) -> Self {
        // Trailing zeros do not change the version: 0.19 == 0.19.0.
        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
        }
        ToolVersion(parts)
    }

    /// Parse the leading dotted-number part of `s` (`"3.0.0a11"` → `3.0.0`).
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for piece in s.trim().split('.') {
            let digits: String = piece.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                break;
            }
            parts.push(digits.parse().ok()?);
            if digits.len() != piece.len() {
                break;
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(ToolVersion::new(parts))
    }
}

impl TryFrom<String> for ToolVersion {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        ToolVersion::parse(&s).ok_or_else(|| format!("invalid version '{s}'"))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

static VERSION_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)version\s+(\d+(?:\.\d+)*\S*)").expect("version banner pattern is valid")
});

/// Extract the version from `cython --version` output, e.g.
/// `Cython version 0.29.36`.
pub fn parse_version_banner(banner: &str) -> Option<ToolVersion> {
    let caps = VERSION_BANNER.captures(banner)?;
    ToolVersion::parse(caps.get(1)?.as_str())
}

/// [`CompilerBackend`] that runs the Cython command line.
#[derive(Debug, Clone)]
pub struct CythonCompiler {
    command: String,
    include_dirs: Vec<PathBuf>,
    fast_fail: bool,
}

impl CythonCompiler {
    /// Create a compiler with already-resolved settings.
    pub fn new(command: impl Into<String>, include_dirs: Vec<PathBuf>, fast_fail: bool) -> Self {
        Self {
            command: command.into(),
            include_dirs,
            fast_fail,
        }
    }

    /// Build a compiler from configuration.
    ///
    /// Relative include dirs are resolved against `base` now, because the
    /// compiler later runs from each source's own directory. With
    /// `fast_fail = "auto"` the installed version is probed once.
    pub fn detect(cfg: &GeneratorSection, base: &Path) -> Self {
        let include_dirs = cfg
            .include_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    base.join(dir)
                }
            })
            .collect();

        let fast_fail = match cfg.fast_fail {
            FastFailMode::Always => true,
            FastFailMode::Never => false,
            FastFailMode::Auto => match probe_version(&cfg.command) {
                Ok(version) => {
                    let enabled = version >= cfg.fast_fail_min_version;
                    info!(command = %cfg.command, version = %version, fast_fail = enabled, "detected compiler version");
                    enabled
                }
                Err(err) => {
                    warn!(command = %cfg.command, error = %err, "could not determine compiler version; not passing --fast-fail");
                    false
                }
            },
        };

        Self::new(cfg.command.clone(), include_dirs, fast_fail)
    }

    pub fn fast_fail(&self) -> bool {
        self.fast_fail
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Full argument list passed to the compiler for one file.
    pub fn args(&self, source_name: &str, output_name: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.fast_fail {
            args.push("--fast-fail".to_string());
        }
        for dir in &self.include_dirs {
            args.push("-I".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }
        args.push("-o".to_string());
        args.push(output_name.to_string());
        args.push(source_name.to_string());
        args
    }
}

fn probe_version(command: &str) -> Result<ToolVersion> {
    let output = Command::new(command)
        .arg("--version")
        .output()
        .map_err(|e| anyhow!("failed to execute {command} --version: {e}"))?;

    // Older Cython releases print the banner on stderr.
    let banner = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    parse_version_banner(&banner)
        .ok_or_else(|| anyhow!("unrecognised version banner: {}", banner.trim()).into())
}

impl CompilerBackend for CythonCompiler {
    fn compile(&mut self, source_name: &str, output_name: &str) -> Result<()> {
        let args = self.args(source_name, output_name);
        info!(command = %self.command, ?args, "running compiler");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|e| anyhow!("failed to execute {}: {e}", self.command))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            debug!(source = %source_name, "compiler stderr: {}", stderr);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(RegenError::Generation {
                path: PathBuf::from(source_name),
                exit_code: output.status.code(),
                stderr,
            })
        }
    }
}
