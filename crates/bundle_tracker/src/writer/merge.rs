use bundle_tracker_core::types::JSONObject;
use serde_json::Value;

use crate::MergeMode;

/// Keys that describe one particular build and are dropped by
/// [`MergeMode::ReplaceStatus`] when a new status arrives
pub const STATUS_SCOPED_KEYS: [&str; 6] = [
  "error",
  "message",
  "file",
  "chunks",
  "startTime",
  "endTime",
];

/// Merge `fragment` into `document`.
///
/// Objects present on both sides are merged key by key; any other value from
/// the fragment, arrays included, replaces what the document held.
pub fn merge_fragment(document: &mut JSONObject, fragment: &JSONObject, mode: MergeMode) {
  if mode == MergeMode::ReplaceStatus && fragment.contains_key("status") {
    for key in STATUS_SCOPED_KEYS {
      document.shift_remove(key);
    }
  }

  deep_merge(document, fragment);
}

fn deep_merge(target: &mut JSONObject, source: &JSONObject) {
  for (key, value) in source {
    if let (Some(Value::Object(existing)), Value::Object(incoming)) = (target.get_mut(key), value) {
      deep_merge(existing, incoming);
      continue;
    }

    target.insert(key.clone(), value.clone());
  }
}
