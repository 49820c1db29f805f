// src/generate/workdir.rs

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::errors::{RegenError, Result};

/// Scoped change of the process working directory.
///
/// The previous directory is restored when the guard is dropped, whether the
/// work done inside the scope succeeded, failed, or panicked.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    /// Change into `dir`. An empty path means "stay where we are".
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = env::current_dir().map_err(RegenError::IoError)?;
        if !dir.as_os_str().is_empty() {
            env::set_current_dir(dir).map_err(|e| RegenError::io(dir, e))?;
            debug!(from = ?previous, to = ?dir, "entered directory");
        }
        Ok(Self { previous })
    }

    /// The directory that will be restored on drop.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            error!(dir = ?self.previous, error = %e, "failed to restore working directory");
        }
    }
}
