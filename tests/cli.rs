use std::env;
use std::error::Error;
use std::fs;

use clap::Parser;
use tempfile::tempdir;

use pyxregen::cli::{CliArgs, DEFAULT_ROOT};
use pyxregen::errors::RegenError;
use pyxregen::generate::WorkdirGuard;
use pyxregen::logging::parse_level_str;
use pyxregen::run;
use pyxregen::walker::RunSummary;
use pyxregen_test_utils::{cwd_lock, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn root_defaults_to_nipy() -> TestResult {
    let args = CliArgs::try_parse_from(["pyxregen"])?;
    assert_eq!(args.root, DEFAULT_ROOT);

    let args = CliArgs::try_parse_from(["pyxregen", "src/pkg"])?;
    assert_eq!(args.root, "src/pkg");

    assert!(CliArgs::try_parse_from(["pyxregen", "a", "b"]).is_err());
    Ok(())
}

#[test]
fn log_levels_parse_case_insensitively() {
    assert_eq!(parse_level_str("DEBUG"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str(" warning "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("loud"), None);
}

#[test]
fn run_on_a_tree_without_sources_does_nothing() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("nipy/docs"))?;
    fs::write(dir.path().join("nipy/docs/index.rst"), "docs\n")?;
    fs::write(
        dir.path().join("pyxregen.toml"),
        "[generator]\ncommand = \"definitely-not-a-real-cython-binary\"\nfast_fail = \"never\"\n",
    )?;

    let summary = {
        let _guard = WorkdirGuard::enter(dir.path())?;
        run(CliArgs::try_parse_from(["pyxregen"])?)?
    };

    assert_eq!(summary, RunSummary::default());
    assert!(!dir.path().join(".pyxregen-hashes.json").exists());
    Ok(())
}

#[test]
fn run_reports_a_failing_compiler() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("pkg"))?;
    fs::write(dir.path().join("pkg/a.pyx"), "cdef int a\n")?;
    fs::write(
        dir.path().join("pyxregen.toml"),
        "[generator]\ncommand = \"definitely-not-a-real-cython-binary\"\nfast_fail = \"never\"\n\n[store]\nfile = \"state.json\"\n",
    )?;

    let before = env::current_dir()?;
    let result = {
        let _guard = WorkdirGuard::enter(dir.path())?;
        run(CliArgs::try_parse_from(["pyxregen", "pkg"])?)
    };

    assert!(matches!(result, Err(RegenError::Other(_))), "{result:?}");
    assert_eq!(env::current_dir()?, before);
    assert!(!dir.path().join("pkg/a.c").exists());
    Ok(())
}

#[test]
fn run_with_missing_root_fails() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let result = {
        let _guard = WorkdirGuard::enter(dir.path())?;
        run(CliArgs::try_parse_from(["pyxregen", "nowhere"])?)
    };
    assert!(matches!(result, Err(RegenError::PathIo { .. })), "{result:?}");
    Ok(())
}
