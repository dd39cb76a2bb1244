use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
  #[error("Invalid bundle tracker options: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("The `path` option must not be empty")]
  EmptyPath,

  #[error("The `filename` option must be a plain file name, got {0:?}")]
  InvalidFilename(String),
}

/// A failure to persist a status fragment to one target file
#[derive(Debug, Error)]
pub enum WriteError {
  #[error("Failed to create directory {}", path.display())]
  CreateDirectory {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to create lock file {}", path.display())]
  Lock {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Timed out after {waited:?} waiting for lock file {}", path.display())]
  LockTimeout { path: PathBuf, waited: Duration },

  #[error("Failed to read {}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to serialize status document for {}", path.display())]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Failed to write {}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
