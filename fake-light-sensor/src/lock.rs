use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::LockError;

const MARKER_NAME: &str = "fake-light-sensor.lock";

/// Marker path under `$XDG_RUNTIME_DIR`, or `/tmp` when unset.
pub fn default_marker_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());

    Path::new(&runtime_dir).join(MARKER_NAME)
}

/// Single-instance guard backed by an exclusive, existence-only lock marker.
///
/// The marker is removed exactly once, either through `release` or on drop,
/// so every exit path that unwinds the stack cleans it up. A process killed
/// uncatchably leaves a stale marker behind; that is an accepted limitation.
pub struct LifecycleGuard {
    path: PathBuf,
    released: bool,
}

impl LifecycleGuard {
    pub fn acquire(path: PathBuf) -> Result<Self, LockError> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                tracing::debug!(marker = %path.display(), "lock marker acquired");
                Ok(Self {
                    path,
                    released: false,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(LockError::AlreadyRunning(path))
            }
            Err(e) => Err(LockError::Io(e)),
        }
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(marker = %self.path.display(), "lock marker released"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(marker = %self.path.display(), "failed to remove lock marker: {e}");
            }
        }
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join(MARKER_NAME);

        let _guard = LifecycleGuard::acquire(marker.clone()).unwrap();

        match LifecycleGuard::acquire(marker) {
            Err(LockError::AlreadyRunning(_)) => {}
            Err(other) => panic!("expected AlreadyRunning, got {other:?}"),
            Ok(_) => panic!("expected AlreadyRunning, got a guard"),
        }
    }

    #[test]
    fn acquire_succeeds_after_release() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join(MARKER_NAME);

        let mut guard = LifecycleGuard::acquire(marker.clone()).unwrap();
        guard.release();
        assert!(!marker.exists());

        let _guard = LifecycleGuard::acquire(marker).unwrap();
    }

    #[test]
    fn release_is_idempotent() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join(MARKER_NAME);

        let mut guard = LifecycleGuard::acquire(marker.clone()).unwrap();
        guard.release();
        guard.release();
        drop(guard);

        assert!(!marker.exists());
    }

    #[test]
    fn drop_removes_the_marker() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join(MARKER_NAME);

        {
            let _guard = LifecycleGuard::acquire(marker.clone()).unwrap();
            assert!(marker.exists());
        }

        assert!(!marker.exists());
    }
}
