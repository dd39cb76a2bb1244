use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use bundle_tracker_filesystem::FileSystem;

use crate::WriteError;

const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq)]
pub struct LockOptions {
  /// Give up after waiting this long
  pub wait: Duration,
  /// Lock files older than this are removed as abandoned
  pub stale: Option<Duration>,
}

/// The marker file guarding `target`, next to it
pub fn lock_path(target: &Path) -> PathBuf {
  let mut path = OsString::from(target.as_os_str());
  path.push(".lock");
  PathBuf::from(path)
}

/// Exclusive hold on a status file, released when dropped.
///
/// Ownership is the existence of the marker file: it is created with
/// create-new semantics, so at most one holder exists across processes.
#[derive(Debug)]
pub struct StatusLock<'a> {
  fs: &'a dyn FileSystem,
  path: PathBuf,
}

impl<'a> StatusLock<'a> {
  /// Create the marker file at `path`, polling with exponential backoff while
  /// another holder has it.
  pub fn acquire(
    fs: &'a dyn FileSystem,
    path: PathBuf,
    options: &LockOptions,
  ) -> Result<Self, WriteError> {
    let started = Instant::now();
    let mut interval = INITIAL_POLL_INTERVAL;

    loop {
      match fs.create_new(&path) {
        Ok(()) => {
          tracing::trace!("Acquired lock {}", path.display());
          return Ok(Self { fs, path });
        }
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
        Err(source) => return Err(WriteError::Lock { path, source }),
      }

      if let Some(stale) = options.stale {
        if remove_if_stale(fs, &path, stale) {
          continue;
        }
      }

      let waited = started.elapsed();
      if waited >= options.wait {
        tracing::warn!(
          "Gave up waiting for lock {} after {:?}",
          path.display(),
          waited
        );
        return Err(WriteError::LockTimeout { path, waited });
      }

      std::thread::sleep(interval.min(options.wait - waited));
      interval = (interval * 2).min(MAX_POLL_INTERVAL);
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for StatusLock<'_> {
  fn drop(&mut self) {
    match self.fs.remove_file(&self.path) {
      Ok(()) => tracing::trace!("Released lock {}", self.path.display()),
      Err(error) => tracing::warn!("Failed to release lock {}: {}", self.path.display(), error),
    }
  }
}

/// Returns true when the lock file is gone, either removed here or by
/// another process in the meantime
fn remove_if_stale(fs: &dyn FileSystem, path: &Path, stale: Duration) -> bool {
  match age(fs, path) {
    Ok(age) if age >= stale => {}
    Ok(_) => return false,
    Err(error) => return error.kind() == io::ErrorKind::NotFound,
  }

  // The marker is moved aside before it is removed. Another process may have
  // replaced it with a live lock after the age check, so the moved file is
  // checked again and put back unless it is still stale.
  let aside = aside_path(path);
  if let Err(error) = fs.rename(path, &aside) {
    return error.kind() == io::ErrorKind::NotFound;
  }

  match age(fs, &aside) {
    Ok(age) if age >= stale => {
      tracing::warn!(
        "Removing stale lock {} left behind {:?} ago",
        path.display(),
        age
      );
      if let Err(error) = fs.remove_file(&aside) {
        tracing::warn!("Failed to remove stale lock {}: {}", aside.display(), error);
      }
      true
    }
    _ => {
      tracing::debug!("Lock {} was renewed, restoring it", path.display());
      if let Err(error) = fs.rename(&aside, path) {
        tracing::warn!("Failed to restore lock {}: {}", path.display(), error);
      }
      false
    }
  }
}

fn age(fs: &dyn FileSystem, path: &Path) -> io::Result<Duration> {
  let modified = fs.modified(path)?;
  Ok(SystemTime::now().duration_since(modified).unwrap_or_default())
}

/// A sibling name unique to this process and call
fn aside_path(lock: &Path) -> PathBuf {
  static COUNTER: AtomicU64 = AtomicU64::new(0);

  let nanos = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|elapsed| elapsed.as_nanos())
    .unwrap_or_default();

  let mut path = OsString::from(lock.as_os_str());
  path.push(format!(
    ".stale.{}.{}.{}",
    std::process::id(),
    nanos,
    COUNTER.fetch_add(1, Ordering::Relaxed)
  ));
  PathBuf::from(path)
}
