// src/generate/rules.rs

//! Static extension → generation rule table.

use std::path::{Path, PathBuf};

/// How a source file becomes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Feed the source straight to the compiler.
    Direct,
    /// Expand the template in-process into an intermediate source, then
    /// compile that.
    TemplateThenCompile,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Suffix a file name must end with (including the leading dot).
    pub source_ext: &'static str,
    /// Extension of the generated file.
    pub output_ext: &'static str,
    /// Extension of the expanded intermediate for template rules.
    pub intermediate_ext: Option<&'static str>,
    pub kind: RuleKind,
}

/// All known rules, longest suffix first.
pub const RULES: &[Rule] = &[
    Rule {
        source_ext: ".pyx.in",
        output_ext: ".c",
        intermediate_ext: Some(".pyx"),
        kind: RuleKind::TemplateThenCompile,
    },
    Rule {
        source_ext: ".pyx",
        output_ext: ".c",
        intermediate_ext: None,
        kind: RuleKind::Direct,
    },
];

/// Find the rule for a file name, if any.
///
/// A bare extension (e.g. a file literally named `.pyx`) has no stem and
/// never matches.
pub fn match_rule(file_name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| {
        file_name.len() > rule.source_ext.len() && file_name.ends_with(rule.source_ext)
    })
}

/// A file the walker will hand to the decider, with its derived paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    rule: &'static Rule,
}

impl SourceFile {
    /// Build a `SourceFile` for `path` if its name matches a rule.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let rule = match_rule(path.file_name()?.to_str()?)?;
        Some(Self { path, rule })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rule(&self) -> &'static Rule {
        self.rule
    }

    pub fn kind(&self) -> RuleKind {
        self.rule.kind
    }

    /// Directory holding the source (and its outputs).
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Bare file name of the source.
    pub fn file_name(&self) -> &str {
        // Construction guarantees a UTF-8 file name.
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    fn stem(&self) -> &str {
        let name = self.file_name();
        &name[..name.len() - self.rule.source_ext.len()]
    }

    /// Bare file name of the generated output.
    pub fn output_name(&self) -> String {
        format!("{}{}", self.stem(), self.rule.output_ext)
    }

    /// Full path of the generated output.
    pub fn output_path(&self) -> PathBuf {
        self.path.with_file_name(self.output_name())
    }

    /// Bare file name of the intermediate, for template rules.
    pub fn intermediate_name(&self) -> Option<String> {
        self.rule
            .intermediate_ext
            .map(|ext| format!("{}{}", self.stem(), ext))
    }

    /// Full path of the intermediate, for template rules.
    pub fn intermediate_path(&self) -> Option<PathBuf> {
        self.intermediate_name()
            .map(|name| self.path.with_file_name(name))
    }
}
