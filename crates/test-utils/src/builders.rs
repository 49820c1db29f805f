#![allow(dead_code)]

use std::path::PathBuf;

use pyxregen::config::{ConfigFile, FastFailMode, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn command(mut self, command: &str) -> Self {
        self.config.generator.command = command.to_string();
        self
    }

    pub fn include_dir(mut self, dir: &str) -> Self {
        self.config.generator.include_dirs.push(PathBuf::from(dir));
        self
    }

    pub fn no_include_dirs(mut self) -> Self {
        self.config.generator.include_dirs.clear();
        self
    }

    pub fn fast_fail(mut self, mode: FastFailMode) -> Self {
        self.config.generator.fast_fail = mode;
        self
    }

    pub fn store_file(mut self, file: &str) -> Self {
        self.config.store.file = file.to_string();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.walk.exclude.push(pattern.to_string());
        self
    }

    pub fn template_var(mut self, name: &str, value: &str) -> Self {
        self.config
            .template
            .vars
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
