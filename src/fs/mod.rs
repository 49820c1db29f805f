// src/fs/mod.rs

//! Filesystem access used by hashing, the hash store, template expansion and
//! tree walking.
//!
//! Everything goes through [`FileSystem`] so the staleness protocol can be
//! exercised against [`mock::MockFileSystem`] without touching disk. The
//! external compiler is the only thing that bypasses it, since it runs as a
//! separate process against the real tree.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RegenError, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Overwrite `path` with `contents`, creating parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` itself is a symbolic link (the link is not followed).
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return the entries of a directory as full paths, in no particular order.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| RegenError::io(path, e))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| RegenError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RegenError::io(parent, e))?;
            }
        }
        fs::write(path, contents).map_err(|e| RegenError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| RegenError::io(path, e))? {
            let entry = entry.map_err(|e| RegenError::io(path, e))?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
