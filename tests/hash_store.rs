use std::error::Error;
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use pyxregen::errors::RegenError;
use pyxregen::fs::mock::MockFileSystem;
use pyxregen::fs::{FileSystem, RealFileSystem};
use pyxregen::hash::{Digest, DigestPair, compute_file_hash, digest_pair};
use pyxregen::store::{FORMAT_VERSION, HashStore, store_key};
use pyxregen_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn file_hash_is_blake3_of_content() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("test.txt", b"hello world");

    let digest = compute_file_hash(&fs, Path::new("test.txt"))?;
    assert_eq!(
        digest.as_str(),
        "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
    );
    assert_eq!(digest, Digest::of_bytes(b"hello world"));
    Ok(())
}

#[test]
fn file_hash_tracks_content_changes_on_disk() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("a.pyx");
    fs::write(&path, "def f(): pass\n")?;
    let before = compute_file_hash(&RealFileSystem, &path)?;

    fs::write(&path, "def f(): pass\r\n")?;
    let after = compute_file_hash(&RealFileSystem, &path)?;

    assert_ne!(before, after);
    Ok(())
}

#[test]
fn unreadable_file_is_an_io_error() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("src/a.pyx", b"x");
    fs.set_unreadable("src/a.pyx");

    let err = compute_file_hash(&fs, Path::new("src/a.pyx")).unwrap_err();
    assert!(matches!(err, RegenError::PathIo { .. }), "got {err:?}");
}

#[test]
fn digest_pair_without_output_has_no_output_digest() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("src/a.pyx", b"cdef int x");

    let pair = digest_pair(&fs, Path::new("src/a.pyx"), Path::new("src/a.c"))?;
    assert_eq!(pair.source, Digest::of_bytes(b"cdef int x"));
    assert_eq!(pair.output, None);

    fs.add_file("src/a.c", b"int x;");
    let pair = digest_pair(&fs, Path::new("src/a.pyx"), Path::new("src/a.c"))?;
    assert_eq!(pair.output, Some(Digest::of_bytes(b"int x;")));
    Ok(())
}

#[test]
fn missing_store_file_loads_empty() {
    init_tracing();

    let fs = MockFileSystem::new();
    let store = HashStore::load(&fs, Path::new(".pyxregen-hashes.json"));
    assert!(store.is_empty());
}

#[test]
fn store_survives_save_and_load_on_disk() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let store_path = dir.path().join(".pyxregen-hashes.json");

    let mut store = HashStore::new();
    let with_output = DigestPair {
        source: Digest::of_bytes(b"src"),
        output: Some(Digest::of_bytes(b"out")),
    };
    let without_output = DigestPair {
        source: Digest::of_bytes(b"other"),
        output: None,
    };
    store.insert(Path::new("nipy/labs/a.pyx"), with_output.clone());
    store.insert(Path::new("nipy/labs/b.pyx.in"), without_output.clone());
    store.save(&RealFileSystem, &store_path)?;

    let loaded = HashStore::load(&RealFileSystem, &store_path);
    assert_eq!(loaded, store);
    assert_eq!(loaded.get(Path::new("nipy/labs/a.pyx")), Some(&with_output));
    assert_eq!(loaded.get(Path::new("nipy/labs/b.pyx.in")), Some(&without_output));

    let json: serde_json::Value = serde_json::from_slice(&fs::read(&store_path)?)?;
    assert_eq!(json["format_version"], FORMAT_VERSION);
    assert!(json["entries"]["nipy/labs/b.pyx.in"]["output"].is_null());
    Ok(())
}

#[test]
fn malformed_or_foreign_store_loads_empty() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let path = Path::new("store.json");

    fs.add_file(path, b"\x80\x03}q\x00.");
    assert!(HashStore::load(&fs, path).is_empty());

    fs.add_file(path, br#"{"format_version": 99, "entries": {"a.pyx": {"source": "00", "output": null}}}"#);
    assert!(HashStore::load(&fs, path).is_empty());

    fs.add_file(path, br#"{"format_version": 1, "entries": {"a.pyx": {"source": "00", "output": null}}}"#);
    assert_eq!(HashStore::load(&fs, path).len(), 1);

    fs.set_unreadable(path);
    assert!(HashStore::load(&fs, path).is_empty());
    Ok(())
}

#[test]
fn store_keys_are_full_normalised_paths() {
    assert_eq!(store_key(Path::new("./nipy/labs/a.pyx")), "nipy/labs/a.pyx");
    assert_eq!(store_key(Path::new("nipy/./labs/a.pyx")), "nipy/labs/a.pyx");
    assert_eq!(store_key(Path::new("../other/a.pyx")), "../other/a.pyx");

    // Same file name in two trees must not collide.
    let mut store = HashStore::new();
    let pair = |s: &[u8]| DigestPair {
        source: Digest::of_bytes(s),
        output: None,
    };
    store.insert(Path::new("tree1/a.pyx"), pair(b"1"));
    store.insert(Path::new("tree2/a.pyx"), pair(b"2"));
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(Path::new("./tree1/a.pyx")), Some(&pair(b"1")));
}

#[test]
fn save_creates_parent_directories() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("nested/dir/store.json");
    HashStore::new().save(&RealFileSystem, &path)?;
    assert!(RealFileSystem.is_file(&path));
    Ok(())
}
