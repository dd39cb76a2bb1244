use serde::Deserialize;
use serde::Serialize;

/// A named group of files emitted by one build unit
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
  pub name: String,

  /// Emitted file names, relative to the output directory
  #[serde(default)]
  pub files: Vec<String>,
}

/// The module an error originated from
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorModule {
  /// The request that pulled the module in, as the user wrote it
  pub user_request: Option<String>,
}

/// A nested rendering of the underlying failure
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorDetails {
  pub code_frame: Option<String>,
  pub message: Option<String>,
}

impl ErrorDetails {
  /// The code frame when there is one, otherwise the plain message
  pub fn rendered(&self) -> Option<&str> {
    self.code_frame.as_deref().or(self.message.as_deref())
  }
}

/// An error object as reported by the bundler
///
/// Messages may contain terminal color escapes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildError {
  /// Kind of the error, such as `ModuleNotFoundError`
  pub name: Option<String>,
  pub message: Option<String>,
  pub module: Option<ErrorModule>,
  #[serde(rename = "error")]
  pub details: Option<ErrorDetails>,
}

impl BuildError {
  pub fn user_request(&self) -> Option<&str> {
    self.module.as_ref()?.user_request.as_deref()
  }
}

/// A single module failed while a build is still in progress
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFailure {
  pub error: BuildError,
}

/// Summary of a finished build
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildStats {
  /// Fatal errors, in the order the bundler reported them
  pub errors: Vec<BuildError>,
  pub chunks: Vec<Chunk>,
  /// Milliseconds since the epoch
  pub start_time: Option<u64>,
  pub end_time: Option<u64>,
}
