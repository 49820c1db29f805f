// src/hash.rs

//! Content digests for source and generated files.

use std::fmt;
use std::path::Path;

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Hex-encoded BLAKE3 digest of a file's full content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Digest of an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        Digest(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digests of a source file and of the output generated from it.
///
/// `output` is `None` while the output file does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestPair {
    pub source: Digest,
    pub output: Option<Digest>,
}

/// Compute the digest of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<Digest> {
    let bytes = fs.read(path)?;
    let digest = Digest::of_bytes(&bytes);
    debug!(path = ?path, digest = %digest, "hashed file");
    Ok(digest)
}

/// Compute the current digest pair for a (source, output) couple.
///
/// A missing output is not an error: it simply yields `output: None`.
pub fn digest_pair(fs: &dyn FileSystem, source: &Path, output: &Path) -> Result<DigestPair> {
    let source_digest = compute_file_hash(fs, source)?;
    let output_digest = if fs.exists(output) {
        Some(compute_file_hash(fs, output)?)
    } else {
        None
    };
    Ok(DigestPair {
        source: source_digest,
        output: output_digest,
    })
}
