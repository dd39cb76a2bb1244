use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// The output section of the bundler's own configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOptions {
  /// Directory the bundler emits files into
  pub path: Option<PathBuf>,

  /// Base URL the bundler prefixes emitted files with
  pub public_path: Option<String>,
}

impl OutputOptions {
  /// The configured public path, treating an empty string as unset
  pub fn public_path(&self) -> Option<&str> {
    self.public_path.as_deref().filter(|p| !p.is_empty())
  }
}
