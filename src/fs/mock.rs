// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::FileSystem;
use crate::errors::{RegenError, Result};

#[derive(Debug, Clone)]
enum MockEntry {
    File(Vec<u8>),
    Dir(BTreeSet<String>),
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    unreadable: HashSet<PathBuf>,
    symlinks: HashSet<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// Clones share the same underlying tree, so a test can keep one handle while
/// the code under test writes through another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file, creating its parent directories implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.lock();
        if let Some(parent) = non_empty_parent(path) {
            ensure_dir(&mut state.entries, parent);
            link_child(&mut state.entries, parent, path);
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    /// Create an empty directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        ensure_dir(&mut state.entries, path.as_ref());
    }

    /// Create a directory that reports itself as a symbolic link.
    pub fn add_dir_symlink(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        ensure_dir(&mut state.entries, path);
        state.symlinks.insert(path.to_path_buf());
    }

    /// Remove a file. Returns whether it existed.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let mut state = self.lock();
        let removed = matches!(
            state.entries.get(path),
            Some(MockEntry::File(_))
        );
        if removed {
            state.entries.remove(path);
            if let (Some(parent), Some(name)) = (non_empty_parent(path), file_name(path)) {
                if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
                    children.remove(&name);
                }
            }
        }
        removed
    }

    /// Make every subsequent read of `path` fail with `PermissionDenied`.
    pub fn set_unreadable(&self, path: impl AsRef<Path>) {
        self.lock().unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Current content of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test must not poison every other handle.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn ensure_dir(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(BTreeSet::new()));
    if let Some(parent) = non_empty_parent(path) {
        if parent != path {
            ensure_dir(entries, parent);
            link_child(entries, parent, path);
        }
    }
}

fn link_child(entries: &mut BTreeMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let (Some(MockEntry::Dir(children)), Some(name)) = (entries.get_mut(parent), file_name(child)) {
        children.insert(name);
    }
}

fn not_found(path: &Path) -> RegenError {
    RegenError::io(path, io::Error::new(io::ErrorKind::NotFound, "no such file"))
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.lock();
        if state.unreadable.contains(path) {
            return Err(RegenError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "unreadable"),
            ));
        }
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(RegenError::io(
                path,
                io::Error::new(io::ErrorKind::Other, "is a directory"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RegenError::io(path, io::Error::new(io::ErrorKind::InvalidData, e))
        })
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.lock().symlinks.contains(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(not_found(path)),
        }
    }
}
