use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::FileSystem;

#[derive(Default, Debug)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  /// Writes into a temporary sibling and renames it over `path`, so concurrent
  /// readers never observe a truncated file.
  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;

    Ok(())
  }

  fn create_new(&self, path: &Path) -> io::Result<()> {
    fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(path)
      .map(|_| ())
  }

  fn remove_file(&self, path: &Path) -> io::Result<()> {
    fs::remove_file(path)
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
  }
}
