// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::generate::compiler::ToolVersion;
use crate::generate::template::TemplateVars;
use crate::store::DEFAULT_STORE_FILE;

/// Configuration exactly as read from `pyxregen.toml`, before validation.
///
/// ```toml
/// [generator]
/// command = "cython"
/// include_dirs = ["lib/fff_python_wrapper"]
/// fast_fail = "auto"
/// fast_fail_min_version = "0.19"
///
/// [store]
/// file = ".pyxregen-hashes.json"
///
/// [walk]
/// exclude = ["**/build/**"]
///
/// [template.vars]
/// precision = "double"
/// ```
///
/// Every section is optional; an absent file is the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub generator: GeneratorSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub walk: WalkSection,

    #[serde(default)]
    pub template: TemplateSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    generator: GeneratorSection,
    store: StoreSection,
    walk: WalkSection,
    template: TemplateSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            generator: raw.generator,
            store: raw.store,
            walk: raw.walk,
            template: raw.template,
        }
    }

    pub fn generator(&self) -> &GeneratorSection {
        &self.generator
    }

    pub fn store(&self) -> &StoreSection {
        &self.store
    }

    pub fn walk(&self) -> &WalkSection {
        &self.walk
    }

    pub fn template(&self) -> &TemplateSection {
        &self.template
    }
}

/// When to pass `--fast-fail` to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FastFailMode {
    /// Probe `<command> --version` and compare with `fast_fail_min_version`.
    #[default]
    Auto,
    Always,
    Never,
}

/// `[generator]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    /// Compiler executable.
    #[serde(default = "default_command")]
    pub command: String,

    /// Include directories passed as `-I`; relative ones are resolved against
    /// the invocation directory.
    #[serde(default = "default_include_dirs")]
    pub include_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub fast_fail: FastFailMode,

    /// Oldest compiler version that understands `--fast-fail`.
    #[serde(default = "default_fast_fail_min_version")]
    pub fast_fail_min_version: ToolVersion,
}

fn default_command() -> String {
    "cython".to_string()
}

fn default_include_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("lib/fff_python_wrapper")]
}

fn default_fast_fail_min_version() -> ToolVersion {
    ToolVersion::new(vec![0, 19])
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            include_dirs: default_include_dirs(),
            fast_fail: FastFailMode::default(),
            fast_fail_min_version: default_fast_fail_min_version(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// File name of the hash store, created in the invocation directory.
    #[serde(default = "default_store_file")]
    pub file: String,
}

fn default_store_file() -> String {
    DEFAULT_STORE_FILE.to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            file: default_store_file(),
        }
    }
}

/// `[walk]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkSection {
    /// Glob patterns, relative to the scan root, of paths to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[template]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSection {
    /// Variables available to every `.pyx.in` template.
    #[serde(default)]
    pub vars: TemplateVars,
}
