use std::fmt::Display;
use std::fmt::Formatter;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::JSONObject;

/// Phase of the most recent build, as written to the status document
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Compiling,
  Error,
  Done,
}

impl Display for Status {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Status::Compiling => "compiling",
      Status::Error => "error",
      Status::Done => "done",
    })
  }
}

/// One emitted file of a chunk
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkFile {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub public_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
}

/// Chunk name to emitted files, in the order the bundler produced them
pub type ChunkMap = IndexMap<String, Vec<ChunkFile>>;

/// A partial status update produced by one lifecycle event.
///
/// Fields that are `None` are left out of the JSON entirely, so merging a
/// fragment never clears keys it does not mention.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFragment {
  pub status: Status,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub chunks: Option<ChunkMap>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub public_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_time: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_time: Option<u64>,
}

impl StatusFragment {
  fn new(status: Status) -> Self {
    Self {
      status,
      error: None,
      file: None,
      message: None,
      chunks: None,
      public_path: None,
      start_time: None,
      end_time: None,
    }
  }

  pub fn compiling() -> Self {
    Self::new(Status::Compiling)
  }

  pub fn error(kind: impl Into<String>) -> Self {
    Self {
      error: Some(kind.into()),
      ..Self::new(Status::Error)
    }
  }

  pub fn done(chunks: ChunkMap) -> Self {
    Self {
      chunks: Some(chunks),
      ..Self::new(Status::Done)
    }
  }

  pub fn to_json_object(&self) -> Result<JSONObject, serde_json::Error> {
    match serde_json::to_value(self)? {
      serde_json::Value::Object(object) => Ok(object),
      other => Err(serde::ser::Error::custom(format!(
        "status fragment serialized to a non-object: {other}"
      ))),
    }
  }
}
