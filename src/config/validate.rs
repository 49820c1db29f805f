// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RegenError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RegenError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_generator(cfg)?;
    validate_store(cfg)?;
    validate_walk(cfg)?;
    validate_template(cfg)?;
    Ok(())
}

fn validate_generator(cfg: &RawConfigFile) -> Result<()> {
    if cfg.generator.command.trim().is_empty() {
        return Err(RegenError::ConfigError(
            "[generator].command must not be empty".to_string(),
        ));
    }
    if cfg
        .generator
        .include_dirs
        .iter()
        .any(|dir| dir.as_os_str().is_empty())
    {
        return Err(RegenError::ConfigError(
            "[generator].include_dirs must not contain empty paths".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    // The store lives in the invocation directory, so only a bare file name
    // is accepted.
    let file = Path::new(&cfg.store.file);
    let mut components = file.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(RegenError::ConfigError(format!(
            "[store].file must be a plain file name (got {:?})",
            cfg.store.file
        ))),
    }
}

fn validate_walk(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg.walk.exclude.iter() {
        Glob::new(pattern).map_err(|e| {
            RegenError::ConfigError(format!(
                "[walk].exclude has invalid glob pattern '{}': {}",
                pattern, e
            ))
        })?;
    }
    Ok(())
}

fn validate_template(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.template.vars.keys() {
        if !is_identifier(name) {
            return Err(RegenError::ConfigError(format!(
                "[template].vars has invalid variable name '{}'",
                name
            )));
        }
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
