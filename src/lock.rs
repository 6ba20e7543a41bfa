// src/lock.rs

//! Advisory directory lock guarding descriptor reads.
//!
//! The external tool and cooperating readers agree that whoever holds the
//! sibling `.<name>.lock` directory owns the descriptor. Creation of a
//! directory is atomic on every platform we care about, so existence of the
//! directory is the whole token. The lock is advisory: it offers no
//! protection against writers that do not participate in the convention.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, thread};

use tracing::{debug, warn};

/// RAII guard over the lock directory; dropping it releases the lock.
#[derive(Debug)]
pub struct DirectoryLock {
    dir: PathBuf,
}

impl DirectoryLock {
    /// Try to acquire the lock for `target` within a bounded retry budget.
    ///
    /// Each failed attempt sleeps `backoff` before retrying; after `attempts`
    /// failures this returns `None`. Callers treat an unacquired lock as a
    /// transient condition (an empty read this cycle), never as an error.
    pub fn acquire(target: &Path, attempts: u32, backoff: Duration) -> Option<DirectoryLock> {
        let dir = lock_dir_for(target);

        for attempt in 1..=attempts {
            match fs::create_dir(&dir) {
                Ok(()) => {
                    debug!(lock = ?dir, attempt, "acquired descriptor lock");
                    return Some(DirectoryLock { dir });
                }
                Err(e) => {
                    debug!(
                        lock = ?dir,
                        attempt,
                        error = %e,
                        "descriptor lock busy; backing off"
                    );
                    if attempt < attempts {
                        thread::sleep(backoff);
                    }
                }
            }
        }

        warn!(
            lock = ?dir,
            attempts,
            "could not acquire descriptor lock within retry budget"
        );
        None
    }

    /// The lock directory this guard owns.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(lock = ?self.dir, error = %e, "failed to release descriptor lock");
        }
    }
}

/// Sibling lock directory for a descriptor path:
/// `Dir/file.ext` locks via `Dir/.file.ext.lock`.
pub fn lock_dir_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "descriptor".to_string());
    let lock_name = format!(".{name}.lock");
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(lock_name),
        _ => PathBuf::from(lock_name),
    }
}
