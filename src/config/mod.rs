// src/config/mod.rs

//! Configuration loading and validation for pyxregen.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate paths, glob patterns and template variable names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, FastFailMode, GeneratorSection, RawConfigFile, StoreSection, TemplateSection,
    WalkSection,
};
