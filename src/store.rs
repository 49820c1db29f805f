// src/store.rs

//! Persistent hash store.
//!
//! Maps each source path to the [`DigestPair`] recorded the last time the
//! walker regenerated it (or confirmed it up to date through version
//! control). The on-disk form is a single JSON document:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "entries": {
//!     "nipy/labs/foo.pyx": { "source": "<hex>", "output": "<hex>" | null }
//!   }
//! }
//! ```
//!
//! Loading never fails: a missing, unreadable or foreign file just means an
//! empty store, which costs at most one VCS consultation per file.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::hash::DigestPair;

/// Default file name of the store, relative to the invocation directory.
pub const DEFAULT_STORE_FILE: &str = ".pyxregen-hashes.json";

/// Version written into every saved store. Stores with any other version are
/// discarded on load.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    format_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, DigestPair>,
}

/// In-memory view of the store, keyed by normalised source path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashStore {
    entries: BTreeMap<String, DigestPair>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`, falling back to an empty store.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Self {
        if !fs.exists(path) {
            debug!(path = ?path, "no hash store yet; starting empty");
            return Self::new();
        }

        let bytes = match fs.read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = ?path, error = %err, "hash store unreadable; starting empty");
                return Self::new();
            }
        };

        match serde_json::from_slice::<StoreDocument>(&bytes) {
            Ok(doc) if doc.format_version == FORMAT_VERSION => {
                debug!(path = ?path, entries = doc.entries.len(), "loaded hash store");
                Self {
                    entries: doc.entries,
                }
            }
            Ok(doc) => {
                warn!(
                    path = ?path,
                    found = doc.format_version,
                    expected = FORMAT_VERSION,
                    "hash store has an unknown format version; starting empty"
                );
                Self::new()
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "hash store is malformed; starting empty");
                Self::new()
            }
        }
    }

    /// Overwrite `path` with the current contents of the store.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let doc = StoreDocument {
            format_version: FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&doc).context("serialising hash store")?;
        fs.write(path, &json)?;
        debug!(path = ?path, entries = self.entries.len(), "saved hash store");
        Ok(())
    }

    pub fn get(&self, source: &Path) -> Option<&DigestPair> {
        self.entries.get(&store_key(source))
    }

    /// Record `pair` for `source`, returning the previous entry.
    pub fn insert(&mut self, source: &Path, pair: DigestPair) -> Option<DigestPair> {
        self.entries.insert(store_key(source), pair)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalise a path into a store key: `.` components dropped, `/` separators.
///
/// The full path (as reached from the scan root) is kept, so several trees can
/// share one store.
pub fn store_key(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut absolute = false;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => absolute = true,
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::ParentDir => parts.push("..".to_string()),
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}
