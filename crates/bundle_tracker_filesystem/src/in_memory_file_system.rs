use std::collections::HashMap;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::FileSystem;

#[cfg(not(target_os = "windows"))]
fn root_dir() -> PathBuf {
  PathBuf::from("/")
}

#[cfg(target_os = "windows")]
fn root_dir() -> PathBuf {
  PathBuf::from("C:/")
}

/// In memory implementation of a file-system entry
#[derive(Debug)]
enum InMemoryFileSystemEntry {
  File {
    contents: Vec<u8>,
    modified: SystemTime,
  },
  Directory,
}

/// In memory implementation of the `FileSystem` trait, for testing purposes.
#[derive(Debug)]
pub struct InMemoryFileSystem {
  files: RwLock<HashMap<PathBuf, InMemoryFileSystemEntry>>,
  current_working_directory: RwLock<PathBuf>,
}

impl Default for InMemoryFileSystem {
  fn default() -> Self {
    Self {
      files: Default::default(),
      current_working_directory: RwLock::new(root_dir()),
    }
  }
}

impl InMemoryFileSystem {
  /// Change the current working directory. Used for resolving relative paths.
  pub fn set_current_working_directory(&self, cwd: &Path) {
    let cwd = self.resolve(cwd);
    *self.current_working_directory.write() = cwd;
  }

  pub fn exists(&self, path: &Path) -> bool {
    let path = self.resolve(path);
    self.files.read().contains_key(&path)
  }

  /// Backdate the modification time of a file
  pub fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
    let path = self.resolve(path);
    let mut files = self.files.write();
    match files.get_mut(&path) {
      Some(InMemoryFileSystemEntry::File { modified, .. }) => {
        *modified = time;
        Ok(())
      }
      _ => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }

  /// Absolute form of `path` with `.` and `..` folded away
  fn resolve(&self, path: &Path) -> PathBuf {
    let joined = self.current_working_directory.read().join(path);

    let mut resolved = PathBuf::new();
    for component in joined.components() {
      match component {
        Component::CurDir => {}
        Component::ParentDir => {
          resolved.pop();
        }
        other => resolved.push(other),
      }
    }

    resolved
  }

  fn insert_file(&self, path: PathBuf, contents: Vec<u8>) {
    let mut files = self.files.write();

    let mut dir = path.parent();
    while let Some(parent) = dir {
      files.insert(parent.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = parent.parent();
    }

    files.insert(
      path,
      InMemoryFileSystemEntry::File {
        contents,
        modified: SystemTime::now(),
      },
    );
  }
}

impl FileSystem for InMemoryFileSystem {
  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path);
    let mut files = self.files.write();

    let ancestors = path.ancestors().collect::<Vec<_>>();
    if ancestors
      .iter()
      .any(|dir| matches!(files.get(*dir), Some(InMemoryFileSystemEntry::File { .. })))
    {
      return Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "Path is a file",
      ));
    }

    for dir in ancestors {
      files.insert(dir.to_path_buf(), InMemoryFileSystemEntry::Directory);
    }

    Ok(())
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.resolve(path);
    let files = self.files.read();
    match files.get(&path) {
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
      Some(InMemoryFileSystemEntry::File { contents, .. }) => Ok(contents.clone()),
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
    }
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let path = self.resolve(path);
    if let Some(InMemoryFileSystemEntry::Directory) = self.files.read().get(&path) {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      ));
    }

    self.insert_file(path, contents.to_vec());
    Ok(())
  }

  fn create_new(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path);
    let mut files = self.files.write();
    if files.contains_key(&path) {
      return Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "File already exists",
      ));
    }

    files.insert(
      path,
      InMemoryFileSystemEntry::File {
        contents: Vec::new(),
        modified: SystemTime::now(),
      },
    );
    Ok(())
  }

  fn remove_file(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path);
    let mut files = self.files.write();
    match files.get(&path) {
      Some(InMemoryFileSystemEntry::File { .. }) => {
        files.remove(&path);
        Ok(())
      }
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    let from = self.resolve(from);
    let to = self.resolve(to);
    let mut files = self.files.write();

    if let Some(InMemoryFileSystemEntry::Directory) = files.get(&to) {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      ));
    }

    match files.remove(&from) {
      Some(entry @ InMemoryFileSystemEntry::File { .. }) => {
        files.insert(to, entry);
        Ok(())
      }
      Some(InMemoryFileSystemEntry::Directory) => {
        files.insert(from, InMemoryFileSystemEntry::Directory);
        Err(io::Error::new(
          io::ErrorKind::InvalidInput,
          "Path is a directory",
        ))
      }
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    let path = self.resolve(path);
    match self.files.read().get(&path) {
      Some(InMemoryFileSystemEntry::File { modified, .. }) => Ok(*modified),
      Some(InMemoryFileSystemEntry::Directory) => Ok(SystemTime::UNIX_EPOCH),
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }
}
