use std::env;
use std::error::Error;
use std::fs;
use std::panic;
use std::path::Path;

use tempfile::tempdir;

use pyxregen::errors::RegenError;
use pyxregen::fs::RealFileSystem;
use pyxregen::generate::template::TemplateVars;
use pyxregen::generate::{Dispatcher, Generator, SourceFile, WorkdirGuard};
use pyxregen_test_utils::recording::{GENERATED_HEADER, RecordingCompiler};
use pyxregen_test_utils::{cwd_lock, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

fn dispatcher(compiler: RecordingCompiler) -> Dispatcher<RealFileSystem, RecordingCompiler> {
    let mut vars = TemplateVars::new();
    vars.insert("precision".to_string(), "double".to_string());
    Dispatcher::new(RealFileSystem, compiler, vars)
}

#[test]
fn direct_rule_compiles_from_the_source_directory() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let pkg = dir.path().join("nipy/labs");
    fs::create_dir_all(&pkg)?;
    let src = pkg.join("linalg.pyx");
    fs::write(&src, "cdef int x\n")?;

    let before = env::current_dir()?;
    let mut dispatcher = dispatcher(RecordingCompiler::new());
    let source = SourceFile::from_path(&src).ok_or("no rule")?;
    dispatcher.generate(&source)?;

    assert_eq!(env::current_dir()?, before);

    let calls = dispatcher.compiler().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].cwd.canonicalize()?, pkg.canonicalize()?);
    assert_eq!(calls[0].source_name, "linalg.pyx");
    assert_eq!(calls[0].output_name, "linalg.c");

    let output = fs::read_to_string(pkg.join("linalg.c"))?;
    assert_eq!(output, format!("{GENERATED_HEADER}cdef int x\n"));
    Ok(())
}

#[test]
fn template_rule_expands_then_compiles_intermediate() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let src = dir.path().join("_kernels.pyx.in");
    fs::write(
        &src,
        "{{for t in [f, d]}}cdef {{precision}} k_{{t}}\n{{endfor}}\n",
    )?;

    let mut dispatcher = dispatcher(RecordingCompiler::new());
    let source = SourceFile::from_path(&src).ok_or("no rule")?;
    dispatcher.generate(&source)?;

    let intermediate = fs::read_to_string(dir.path().join("_kernels.pyx"))?;
    assert_eq!(intermediate, "cdef double k_f\ncdef double k_d\n");

    let calls = dispatcher.compiler().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].source_name, "_kernels.pyx");
    assert_eq!(calls[0].output_name, "_kernels.c");

    let output = fs::read_to_string(dir.path().join("_kernels.c"))?;
    assert_eq!(output, format!("{GENERATED_HEADER}{intermediate}"));
    Ok(())
}

#[test]
fn compiler_failure_restores_directory_and_names_the_source() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let src = dir.path().join("broken.pyx");
    fs::write(&src, "cdef\n")?;

    let before = env::current_dir()?;
    let mut dispatcher = dispatcher(RecordingCompiler::new().fail_on("broken.pyx"));
    let source = SourceFile::from_path(&src).ok_or("no rule")?;
    let err = dispatcher.generate(&source).unwrap_err();

    assert_eq!(env::current_dir()?, before);
    match err {
        RegenError::Generation {
            path, exit_code, ..
        } => {
            assert_eq!(path, src);
            assert_eq!(exit_code, Some(1));
        }
        other => panic!("expected generation error, got {other:?}"),
    }
    assert!(!dir.path().join("broken.c").exists());
    Ok(())
}

#[test]
fn template_error_skips_the_compiler() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let src = dir.path().join("bad.pyx.in");
    fs::write(&src, "ok\n{{undefined_name}}\n")?;

    let mut dispatcher = dispatcher(RecordingCompiler::new());
    let source = SourceFile::from_path(&src).ok_or("no rule")?;
    let err = dispatcher.generate(&source).unwrap_err();

    match err {
        RegenError::Template { line, message } => {
            assert_eq!(line, 2);
            assert!(message.contains("bad.pyx.in"), "{message}");
        }
        other => panic!("expected template error, got {other:?}"),
    }
    assert!(dispatcher.compiler().calls().is_empty());
    assert!(!dir.path().join("bad.pyx").exists());
    Ok(())
}

#[test]
fn relative_source_paths_resolve_from_the_invocation_directory() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("nipy/core"))?;
    fs::write(dir.path().join("nipy/core/_a.pyx"), "a\n")?;

    let before = env::current_dir()?;
    let result = {
        let _guard = WorkdirGuard::enter(dir.path())?;
        let mut dispatcher = dispatcher(RecordingCompiler::new());
        let source = SourceFile::from_path("nipy/core/_a.pyx").ok_or("no rule")?;
        dispatcher.generate(&source)?;
        env::current_dir()?
    };

    assert_eq!(result.canonicalize()?, dir.path().canonicalize()?);
    assert_eq!(env::current_dir()?, before);
    assert!(dir.path().join("nipy/core/_a.c").is_file());
    Ok(())
}

#[test]
fn workdir_guard_restores_after_panic() -> TestResult {
    init_tracing();
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let target = dir.path().to_path_buf();
    let before = env::current_dir()?;

    let outcome = panic::catch_unwind(|| {
        let guard = WorkdirGuard::enter(&target).expect("enter tempdir");
        assert_eq!(guard.previous(), before.as_path());
        panic!("compiler blew up");
    });

    assert!(outcome.is_err());
    assert_eq!(env::current_dir()?, before);
    Ok(())
}

#[test]
fn workdir_guard_with_empty_path_stays_put() -> TestResult {
    let _lock = cwd_lock();

    let before = env::current_dir()?;
    {
        let _guard = WorkdirGuard::enter(Path::new(""))?;
        assert_eq!(env::current_dir()?, before);
    }
    assert_eq!(env::current_dir()?, before);
    Ok(())
}

#[test]
fn entering_a_missing_directory_fails_without_moving() -> TestResult {
    let _lock = cwd_lock();

    let dir = tempdir()?;
    let before = env::current_dir()?;
    let err = WorkdirGuard::enter(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, RegenError::PathIo { .. }), "got {err:?}");
    assert_eq!(env::current_dir()?, before);
    Ok(())
}
