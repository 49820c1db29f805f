use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pyxregen::errors::{RegenError, Result};
use pyxregen::fs::FileSystem;
use pyxregen::fs::mock::MockFileSystem;
use pyxregen::generate::{CompilerBackend, Generator, RuleKind, SourceFile};

/// Prefix written in front of the source content by the fakes below.
pub const GENERATED_HEADER: &str = "/* generated */\n";

/// A generator that:
/// - records which sources it was asked to regenerate
/// - writes the output (and, for templates, the intermediate) into a
///   `MockFileSystem`, without running anything.
#[derive(Debug)]
pub struct RecordingGenerator {
    fs: MockFileSystem,
    calls: Vec<PathBuf>,
    fail_on: Option<PathBuf>,
}

impl RecordingGenerator {
    pub fn new(fs: MockFileSystem) -> Self {
        Self {
            fs,
            calls: Vec::new(),
            fail_on: None,
        }
    }

    /// Fail with a `Generation` error when asked to regenerate `path`.
    pub fn fail_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_on = Some(path.into());
        self
    }

    pub fn calls(&self) -> &[PathBuf] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Generator for RecordingGenerator {
    fn generate(&mut self, source: &SourceFile) -> Result<()> {
        self.calls.push(source.path().to_path_buf());

        if self.fail_on.as_deref() == Some(source.path()) {
            return Err(RegenError::Generation {
                path: source.path().to_path_buf(),
                exit_code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        let content = self.fs.read(source.path())?;
        if source.kind() == RuleKind::TemplateThenCompile {
            if let Some(intermediate) = source.intermediate_path() {
                self.fs.write(&intermediate, &content)?;
            }
        }

        let mut output = GENERATED_HEADER.as_bytes().to_vec();
        output.extend_from_slice(&content);
        self.fs.write(&source.output_path(), &output)
    }
}

/// One call observed by [`RecordingCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCall {
    pub cwd: PathBuf,
    pub source_name: String,
    pub output_name: String,
}

/// A compiler backend that writes its output with `std::fs` relative to the
/// current working directory, and records where it was run from.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
    calls: Vec<CompileCall>,
    fail_on: Option<String>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail (after recording the call) when compiling `source_name`.
    pub fn fail_on(mut self, source_name: &str) -> Self {
        self.fail_on = Some(source_name.to_string());
        self
    }

    pub fn calls(&self) -> &[CompileCall] {
        &self.calls
    }
}

impl CompilerBackend for RecordingCompiler {
    fn compile(&mut self, source_name: &str, output_name: &str) -> Result<()> {
        let cwd = env::current_dir()?;
        self.calls.push(CompileCall {
            cwd,
            source_name: source_name.to_string(),
            output_name: output_name.to_string(),
        });

        if self.fail_on.as_deref() == Some(source_name) {
            return Err(RegenError::Generation {
                path: PathBuf::from(source_name),
                exit_code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        // Bare names: this only works if the dispatcher entered the
        // source's directory.
        let content = fs::read(Path::new(source_name))?;
        let mut output = GENERATED_HEADER.as_bytes().to_vec();
        output.extend_from_slice(&content);
        fs::write(Path::new(output_name), output)?;
        Ok(())
    }
}
