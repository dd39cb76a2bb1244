use std::path::Path;
use std::path::PathBuf;

use bundle_tracker_core::types::StatusFragment;

pub const NAME_PLACEHOLDER: &str = "[name]";

/// Substitute `[name]` in the directory template and append the file name
pub fn target_path(template: &str, name: &str, filename: &str) -> PathBuf {
  Path::new(&template.replace(NAME_PLACEHOLDER, name)).join(filename)
}

/// Every file a fragment has to be written to.
///
/// Fragments with chunks go to one file per chunk name. Fragments without
/// chunks go to the single file with an empty name. Templates without
/// `[name]` collapse to one path, which is returned once.
pub fn resolve_target_paths(
  template: &str,
  filename: &str,
  fragment: &StatusFragment,
) -> Vec<PathBuf> {
  let Some(chunks) = &fragment.chunks else {
    return vec![target_path(template, "", filename)];
  };

  let mut paths: Vec<PathBuf> = Vec::with_capacity(chunks.len());
  for name in chunks.keys() {
    let path = target_path(template, name, filename);
    if !paths.contains(&path) {
      paths.push(path);
    }
  }

  paths
}
