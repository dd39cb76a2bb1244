use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// In-memory file-system for testing
pub mod in_memory_file_system;

/// File-system implementation using std::fs, with atomic replacing writes
pub mod os_file_system;

/// FileSystem abstraction instance
///
/// This should be `OsFileSystem` for non-testing environments and `InMemoryFileSystem` for testing.
pub type FileSystemRef = Arc<dyn FileSystem + Send + Sync>;

/// Trait abstracting the file-system operations the status writer needs.
///
/// `write` must replace the file so that readers see either the previous or
/// the new contents, never a partial file. `create_new` must fail with
/// `ErrorKind::AlreadyExists` when the path exists, across processes.
#[mockall::automock]
pub trait FileSystem: std::fmt::Debug {
  /// Create a directory and all of its missing parents
  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

  /// Exclusively create an empty file
  fn create_new(&self, path: &Path) -> io::Result<()>;

  fn remove_file(&self, path: &Path) -> io::Result<()>;

  /// Atomically move a file, replacing `to` if it exists
  fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

  fn modified(&self, _path: &Path) -> io::Result<SystemTime> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      "Not implemented: FileSystem::modified",
    ))
  }
}
