//! Scoped working-directory redirection.
//!
//! Resource properties may reference local files by relative path; those
//! paths must resolve against the directory containing the stack
//! configuration, not wherever the invoker's shell happens to be. The
//! scope restores the original directory on drop, so restoration holds on
//! every exit path including error propagation out of a deploy call.

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Serializes tests that touch the process-global working directory.
#[cfg(test)]
pub(crate) static TEST_CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// RAII guard that redirects the process working directory.
#[derive(Debug)]
pub struct WorkingDirectoryScope {
    /// Directory to restore on drop.
    original: PathBuf,
}

impl WorkingDirectoryScope {
    /// Changes the working directory to `dir` for the lifetime of the
    /// returned guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined or
    /// `dir` cannot be entered.
    pub fn enter(dir: impl AsRef<Path>) -> Result<Self> {
        let original = env::current_dir()?;
        let dir = dir.as_ref();

        env::set_current_dir(dir)?;
        debug!("Working directory: {}", dir.display());

        Ok(Self { original })
    }
}

impl Drop for WorkingDirectoryScope {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.original) {
            // Nothing sensible to propagate from a destructor.
            tracing::error!(
                "Failed to restore working directory to {}: {e}",
                self.original.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use super::TEST_CWD_LOCK as CWD_LOCK;

    #[test]
    fn test_scope_enters_and_restores() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let before = env::current_dir().expect("Failed to read cwd");

        {
            let _scope =
                WorkingDirectoryScope::enter(temp_dir.path()).expect("Failed to enter scope");
            let inside = env::current_dir().expect("Failed to read cwd");
            assert_eq!(
                inside.canonicalize().unwrap(),
                temp_dir.path().canonicalize().unwrap()
            );
        }

        assert_eq!(env::current_dir().expect("Failed to read cwd"), before);
    }

    #[test]
    fn test_scope_restores_on_panic_path() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let before = env::current_dir().expect("Failed to read cwd");

        let result = std::panic::catch_unwind(|| {
            let _scope =
                WorkingDirectoryScope::enter(temp_dir.path()).expect("Failed to enter scope");
            panic!("deploy failed");
        });

        assert!(result.is_err());
        assert_eq!(env::current_dir().expect("Failed to read cwd"), before);
    }

    #[test]
    fn test_enter_missing_directory_fails() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = WorkingDirectoryScope::enter("/nonexistent/lakestack-test-dir");
        assert!(result.is_err());
    }
}
