// src/generate/dispatcher.rs

use tracing::{debug, info};

use super::compiler::CompilerBackend;
use super::rules::{RuleKind, SourceFile};
use super::template::{TemplateVars, expand};
use super::workdir::WorkdirGuard;
use crate::errors::{RegenError, Result};
use crate::fs::FileSystem;

/// Trait abstracting how a stale source gets regenerated.
///
/// Production code uses [`Dispatcher`]; walker tests substitute a generator
/// that records calls instead of running anything.
pub trait Generator {
    fn generate(&mut self, source: &SourceFile) -> Result<()>;
}

/// Routes a source to its rule and runs the compiler from the source's
/// directory.
#[derive(Debug)]
pub struct Dispatcher<F, C> {
    fs: F,
    compiler: C,
    vars: TemplateVars,
}

impl<F: FileSystem, C: CompilerBackend> Dispatcher<F, C> {
    pub fn new(fs: F, compiler: C, vars: TemplateVars) -> Self {
        Self { fs, compiler, vars }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Expand a `.pyx.in` template into its intermediate `.pyx`, returning
    /// the intermediate's bare file name.
    fn expand_template(&self, source: &SourceFile) -> Result<String> {
        let (Some(name), Some(path)) = (source.intermediate_name(), source.intermediate_path())
        else {
            return Err(anyhow::anyhow!(
                "rule for {:?} has no intermediate extension",
                source.path()
            )
            .into());
        };

        let template = self.fs.read_to_string(source.path())?;
        let expanded = expand(&template, &self.vars).map_err(|err| match err {
            RegenError::Template { line, message } => RegenError::Template {
                line,
                message: format!("{}: {}", source.path().display(), message),
            },
            other => other,
        })?;
        self.fs.write(&path, expanded.as_bytes())?;
        debug!(template = ?source.path(), intermediate = ?path, "expanded template");
        Ok(name)
    }
}

impl<F: FileSystem, C: CompilerBackend> Generator for Dispatcher<F, C> {
    fn generate(&mut self, source: &SourceFile) -> Result<()> {
        info!(source = ?source.path(), rule = ?source.kind(), "regenerating");

        // Expansion only touches the filesystem through full paths, so it
        // happens before the directory change.
        let compile_name = match source.kind() {
            RuleKind::Direct => source.file_name().to_string(),
            RuleKind::TemplateThenCompile => self.expand_template(source)?,
        };
        let output_name = source.output_name();

        let _guard = WorkdirGuard::enter(source.dir())?;
        self.compiler
            .compile(&compile_name, &output_name)
            .map_err(|err| match err {
                RegenError::Generation {
                    exit_code, stderr, ..
                } => RegenError::Generation {
                    path: source.path().to_path_buf(),
                    exit_code,
                    stderr,
                },
                other => other,
            })
    }
}
