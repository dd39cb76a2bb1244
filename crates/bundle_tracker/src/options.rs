use std::path::Path;
use std::time::Duration;

use bundle_tracker_core::types::OutputOptions;
use serde::Deserialize;
use serde::Serialize;

use crate::OptionsError;

pub const DEFAULT_FILENAME: &str = "webpack-stats.json";

/// How long a writer waits for the lock on a status file
pub const DEFAULT_LOCK_WAIT_MS: u64 = 90 * 1000;

/// JSON pretty-printing never indents wider than this
pub const MAX_INDENT: usize = 10;

/// How a fragment is combined with the document already on disk
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMode {
  /// Deep-merge every fragment; keys from earlier builds persist
  #[default]
  Deep,
  /// Drop the previous build's status fields before merging a fragment that
  /// carries a status
  ReplaceStatus,
}

/// Options the host passes when constructing the plugin
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleTrackerOptions {
  /// Name of the status file inside each output directory
  #[serde(default = "default_filename")]
  pub filename: String,

  /// Output directory template. `[name]` is replaced with the chunk name, or
  /// with nothing for fragments that have no chunks.
  pub path: String,

  /// Overrides the bundler's configured public path
  #[serde(default)]
  pub public_path: Option<String>,

  /// Record `startTime` and `endTime` of successful builds
  #[serde(default)]
  pub log_time: bool,

  /// Pretty-print width; compact JSON when unset
  #[serde(default)]
  pub indent: Option<usize>,

  #[serde(default)]
  pub merge: MergeMode,

  /// Milliseconds to wait for the lock before failing the write
  #[serde(default = "default_lock_wait")]
  pub lock_wait: u64,

  /// Milliseconds after which a lock file is considered abandoned. The marker
  /// is not refreshed while held, so this must exceed the longest write.
  #[serde(default)]
  pub lock_stale: Option<u64>,
}

fn default_filename() -> String {
  String::from(DEFAULT_FILENAME)
}

fn default_lock_wait() -> u64 {
  DEFAULT_LOCK_WAIT_MS
}

impl BundleTrackerOptions {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      filename: default_filename(),
      path: path.into(),
      public_path: None,
      log_time: false,
      indent: None,
      merge: MergeMode::default(),
      lock_wait: DEFAULT_LOCK_WAIT_MS,
      lock_stale: None,
    }
  }

  /// Parse and validate the host's JSON options object
  pub fn from_json(value: serde_json::Value) -> Result<Self, OptionsError> {
    let options: Self = serde_json::from_value(value).map_err(OptionsError::Parse)?;
    options.validate()?;
    Ok(options)
  }

  pub fn validate(&self) -> Result<(), OptionsError> {
    if self.path.is_empty() {
      return Err(OptionsError::EmptyPath);
    }

    let filename = Path::new(&self.filename);
    if self.filename.is_empty() || filename.file_name() != Some(filename.as_os_str()) {
      return Err(OptionsError::InvalidFilename(self.filename.clone()));
    }

    Ok(())
  }

  /// The public path base, preferring the override over the bundler's own.
  /// Empty strings count as unset.
  pub fn resolve_public_path<'a>(&'a self, output: &'a OutputOptions) -> Option<&'a str> {
    self
      .public_path
      .as_deref()
      .filter(|p| !p.is_empty())
      .or_else(|| output.public_path())
  }

  /// Effective indent width, `None` for compact output
  pub fn indent_width(&self) -> Option<usize> {
    self
      .indent
      .map(|width| width.min(MAX_INDENT))
      .filter(|width| *width > 0)
  }

  pub fn lock_wait(&self) -> Duration {
    Duration::from_millis(self.lock_wait)
  }

  pub fn lock_stale(&self) -> Option<Duration> {
    self.lock_stale.map(Duration::from_millis)
  }
}
