//! Advisory locks for the regeneration sweep
//!
//! Only one instance should sweep at a time. Acquisition never blocks: an
//! instance that loses the race skips its sweep.
//!
//! - `InMemoryLock`: single-process lock for tests
//! - `FileAdvisoryLock`: lock file in a directory shared by every instance,
//!   created atomically and holding the owner's PID. Lock files left behind
//!   by dead processes, or never given a PID, are reclaimed by one instance
//!   at a time.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Lock errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] io::Error),
    #[error("lock state poisoned")]
    Poisoned,
}

/// Named, non-blocking mutual exclusion shared across instances.
pub trait AdvisoryLock: Send + Sync {
    /// Take the lock if nobody holds it. `Ok(false)` means someone else does.
    fn try_acquire(&self, key: &str) -> Result<bool, LockError>;

    /// Give the lock back. Releasing a lock not held is a no-op.
    fn release(&self, key: &str) -> Result<(), LockError>;
}

/// Held lock; released when dropped.
pub struct LockGuard<'a> {
    lock: &'a dyn AdvisoryLock,
    key: String,
}

impl std::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to release advisory lock");
        }
    }
}

/// Try to take `key`, returning a guard that releases it on every exit path.
pub fn try_lock<'a>(lock: &'a dyn AdvisoryLock, key: &str) -> Result<Option<LockGuard<'a>>, LockError> {
    if lock.try_acquire(key)? {
        Ok(Some(LockGuard {
            lock,
            key: key.to_string(),
        }))
    } else {
        Ok(None)
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryLock {
    held: Mutex<HashSet<String>>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().map(|h| h.contains(key)).unwrap_or(false)
    }
}

impl AdvisoryLock for InMemoryLock {
    fn try_acquire(&self, key: &str) -> Result<bool, LockError> {
        let mut held = self.held.lock().map_err(|_| LockError::Poisoned)?;
        Ok(held.insert(key.to_string()))
    }

    fn release(&self, key: &str) -> Result<(), LockError> {
        let mut held = self.held.lock().map_err(|_| LockError::Poisoned)?;
        held.remove(key);
        Ok(())
    }
}

// ============================================================================
// Lock file
// ============================================================================

/// Age after which a lock file with no PID is treated as abandoned.
const UNWRITTEN_LOCK_GRACE: Duration = Duration::from_secs(10);

/// Age after which a reclaim marker left by a crashed instance is removed.
const RECLAIM_MARKER_GRACE: Duration = Duration::from_secs(30);

/// What an existing lock file says about its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    /// No lock file
    Gone,
    Live(u32),
    Dead(u32),
    /// No PID yet, still inside the grace period
    Starting,
    /// No PID and older than the grace period
    Abandoned,
}

impl Holder {
    fn is_stale(self) -> bool {
        matches!(self, Holder::Dead(_) | Holder::Abandoned)
    }
}

/// Lock files under a shared directory, one per key.
///
/// Only one instance may clear a stale lock file at a time: the reclaimer
/// must first create the key's `.reclaim` marker, then re-check the holder
/// before deleting anything.
#[derive(Debug, Clone)]
pub struct FileAdvisoryLock {
    dir: PathBuf,
}

impl FileAdvisoryLock {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the lock file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.lock"))
    }

    fn reclaim_marker_for(path: &Path) -> PathBuf {
        path.with_extension("reclaim")
    }

    /// Atomically create `path` holding our PID. `Ok(false)` if it exists.
    ///
    /// A file whose PID cannot be written is removed again.
    fn create(path: &Path) -> Result<bool, LockError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(LockError::Io(path.to_path_buf(), e)),
        };
        let written = writeln!(file, "{}", std::process::id()).and_then(|()| file.sync_all());
        drop(file);
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(path = ?path, error = %cleanup, "Failed to remove unwritten lock file");
            }
            return Err(LockError::Io(path.to_path_buf(), e));
        }
        Ok(true)
    }

    fn remove_if_present(path: &Path) -> Result<(), LockError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Io(path.to_path_buf(), e)),
        }
    }

    fn age(path: &Path) -> Option<Duration> {
        fs::metadata(path).and_then(|m| m.modified()).ok()?.elapsed().ok()
    }

    fn recorded_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    fn holder(path: &Path) -> Holder {
        let Ok(contents) = fs::read_to_string(path) else {
            return Holder::Gone;
        };
        match contents.trim().parse::<u32>() {
            Ok(pid) if is_process_running(pid) => Holder::Live(pid),
            Ok(pid) => Holder::Dead(pid),
            Err(_) => match Self::age(path) {
                Some(age) if age >= UNWRITTEN_LOCK_GRACE => Holder::Abandoned,
                _ => Holder::Starting,
            },
        }
    }

    /// Replace a stale lock file with our own, serialized by the reclaim marker.
    fn reclaim(key: &str, path: &Path, seen: Holder) -> Result<bool, LockError> {
        let marker = Self::reclaim_marker_for(path);
        if !Self::create(&marker)? {
            if Self::age(&marker).is_some_and(|age| age >= RECLAIM_MARKER_GRACE) {
                warn!(key, "Removing abandoned reclaim marker");
                Self::remove_if_present(&marker)?;
            }
            return Ok(false);
        }

        let result = Self::reclaim_marked(key, path, seen);
        if let Err(e) = Self::remove_if_present(&marker) {
            warn!(key, error = %e, "Failed to remove reclaim marker");
        }
        result
    }

    fn reclaim_marked(key: &str, path: &Path, seen: Holder) -> Result<bool, LockError> {
        // Another instance may have reclaimed it since we looked
        let current = Self::holder(path);
        if current == Holder::Gone {
            return Self::create(path);
        }
        if !current.is_stale() {
            debug!(key, holder = ?current, "Lock changed hands before reclaim, backing off");
            return Ok(false);
        }
        info!(key, holder = ?seen, "Reclaiming stale advisory lock");
        Self::remove_if_present(path)?;
        Self::create(path)
    }
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // Signal 0 checks existence without delivering anything.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    true
}

impl AdvisoryLock for FileAdvisoryLock {
    fn try_acquire(&self, key: &str) -> Result<bool, LockError> {
        fs::create_dir_all(&self.dir).map_err(|e| LockError::Io(self.dir.clone(), e))?;
        let path = self.path_for(key);

        if Self::create(&path)? {
            debug!(key, path = ?path, "Acquired advisory lock");
            return Ok(true);
        }

        match Self::holder(&path) {
            // Removed between our attempt and the read
            Holder::Gone => Self::create(&path),
            Holder::Live(_) | Holder::Starting => Ok(false),
            stale => Self::reclaim(key, &path, stale),
        }
    }

    fn release(&self, key: &str) -> Result<(), LockError> {
        let path = self.path_for(key);
        if Self::recorded_pid(&path) == Some(std::process::id()) {
            fs::remove_file(&path).map_err(|e| LockError::Io(path.clone(), e))?;
            debug!(key, "Released advisory lock");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_exclusive() {
        let lock = InMemoryLock::new();
        assert!(lock.try_acquire("sweep").unwrap());
        assert!(!lock.try_acquire("sweep").unwrap());
        assert!(lock.try_acquire("other").unwrap());
        lock.release("sweep").unwrap();
        assert!(lock.try_acquire("sweep").unwrap());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = InMemoryLock::new();
        {
            let guard = try_lock(&lock, "sweep").unwrap();
            assert!(guard.is_some());
            assert!(try_lock(&lock, "sweep").unwrap().is_none());
        }
        assert!(!lock.is_held("sweep"));
    }

    #[test]
    fn test_file_lock_exclusive_and_released() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let other_instance = FileAdvisoryLock::new(dir.path());

        assert!(lock.try_acquire("caddie-plan-regeneration").unwrap());
        let path = lock.path_for("caddie-plan-regeneration");
        let pid: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());

        assert!(!other_instance.try_acquire("caddie-plan-regeneration").unwrap());
        lock.release("caddie-plan-regeneration").unwrap();
        assert!(!path.exists());
        assert!(other_instance.try_acquire("caddie-plan-regeneration").unwrap());
    }

    #[test]
    fn test_stale_lock_file_reclaimed() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");
        fs::write(&path, "999999999\n").unwrap();

        assert!(lock.try_acquire("sweep").unwrap());
        let pid: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn test_key_sanitised() {
        let lock = FileAdvisoryLock::new("/tmp/locks");
        assert_eq!(lock.path_for("a/b c"), PathBuf::from("/tmp/locks/a_b_c.lock"));
    }

    fn age_file(path: &Path, by: Duration) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(std::time::SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_fresh_unwritten_lock_file_counts_as_held() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");
        fs::write(&path, "").unwrap();

        assert!(!lock.try_acquire("sweep").unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_abandoned_unwritten_lock_file_reclaimed() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");
        fs::write(&path, "").unwrap();
        age_file(&path, UNWRITTEN_LOCK_GRACE + Duration::from_secs(5));

        assert!(lock.try_acquire("sweep").unwrap());
        let pid: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
        assert!(!FileAdvisoryLock::reclaim_marker_for(&path).exists());
    }

    #[test]
    fn test_reclaim_skipped_while_another_instance_reclaims() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");
        fs::write(&path, "999999999\n").unwrap();
        let marker = FileAdvisoryLock::reclaim_marker_for(&path);
        fs::write(&marker, "1\n").unwrap();

        assert!(!lock.try_acquire("sweep").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "999999999");

        fs::remove_file(&marker).unwrap();
        assert!(lock.try_acquire("sweep").unwrap());
    }

    #[test]
    fn test_reclaim_backs_off_when_lock_changed_hands() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");

        // Saw a dead holder, but a live instance replaced the file first
        fs::write(&path, format!("{}\n", std::process::id())).unwrap();
        let acquired = FileAdvisoryLock::reclaim("sweep", &path, Holder::Dead(999_999_999)).unwrap();

        assert!(!acquired);
        let pid: u32 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
        assert!(!FileAdvisoryLock::reclaim_marker_for(&path).exists());
    }

    #[test]
    fn test_abandoned_reclaim_marker_removed() {
        let dir = tempdir().unwrap();
        let lock = FileAdvisoryLock::new(dir.path());
        let path = lock.path_for("sweep");
        fs::write(&path, "999999999\n").unwrap();
        let marker = FileAdvisoryLock::reclaim_marker_for(&path);
        fs::write(&marker, "999999999\n").unwrap();
        age_file(&marker, RECLAIM_MARKER_GRACE + Duration::from_secs(5));

        assert!(!lock.try_acquire("sweep").unwrap());
        assert!(!marker.exists());
        assert!(lock.try_acquire("sweep").unwrap());
    }
}
