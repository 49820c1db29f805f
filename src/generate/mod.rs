// src/generate/mod.rs

//! Regeneration of stale outputs.
//!
//! - [`rules`] maps file extensions to a [`rules::RuleKind`].
//! - [`template`] expands `.pyx.in` templates in-process.
//! - [`compiler`] owns the `CompilerBackend` trait and the real
//!   `CythonCompiler`, which spawns the external tool.
//! - [`workdir`] provides the scoped working-directory change the compiler
//!   runs under.
//! - [`dispatcher`] ties these together behind the `Generator` trait the
//!   walker drives.

pub mod compiler;
pub mod dispatcher;
pub mod rules;
pub mod template;
pub mod workdir;

pub use compiler::{CompilerBackend, CythonCompiler, ToolVersion};
pub use dispatcher::{Dispatcher, Generator};
pub use rules::{RULES, Rule, RuleKind, SourceFile, match_rule};
pub use workdir::WorkdirGuard;
