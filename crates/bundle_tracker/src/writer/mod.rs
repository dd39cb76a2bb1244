use std::io;
use std::path::Path;
use std::sync::Arc;

use bundle_tracker_core::plugin::StatusSink;
use bundle_tracker_core::types::JSONObject;
use bundle_tracker_core::types::OutputOptions;
use bundle_tracker_core::types::StatusFragment;
use bundle_tracker_filesystem::FileSystemRef;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

use self::lock::lock_path;
use self::lock::LockOptions;
use self::lock::StatusLock;
use self::merge::merge_fragment;
use self::target_paths::resolve_target_paths;
use crate::BundleTrackerOptions;
use crate::WriteError;

pub mod lock;
pub mod merge;
pub mod target_paths;

/// Persists status fragments into status files shared between processes.
///
/// Every write is a read-merge-write of the file on disk performed while
/// holding the file's lock. Nothing is cached between writes.
#[derive(Debug)]
pub struct StatusWriter {
  fs: FileSystemRef,
  options: Arc<BundleTrackerOptions>,
}

impl StatusWriter {
  pub fn new(fs: FileSystemRef, options: Arc<BundleTrackerOptions>) -> Self {
    Self { fs, options }
  }

  /// Merge `fragment` into every status file it targets.
  ///
  /// Targets are written one after the other; the first failure stops the
  /// remaining targets from being written.
  #[tracing::instrument(level = "debug", skip_all, fields(status = %fragment.status))]
  pub fn write_output(
    &self,
    mut fragment: StatusFragment,
    output: &OutputOptions,
  ) -> Result<(), WriteError> {
    let targets = resolve_target_paths(&self.options.path, &self.options.filename, &fragment);
    let Some(first_target) = targets.first() else {
      tracing::warn!("Build reported no chunks, the status file was not updated");
      return Ok(());
    };

    if let Some(public_path) = self.options.resolve_public_path(output) {
      fragment.public_path = Some(public_path.to_string());
    }

    let fragment = fragment
      .to_json_object()
      .map_err(|source| WriteError::Serialize {
        path: first_target.clone(),
        source,
      })?;

    for target in &targets {
      self.write_target(target, &fragment)?;
    }

    Ok(())
  }

  fn write_target(&self, target: &Path, fragment: &JSONObject) -> Result<(), WriteError> {
    if let Some(dir) = target.parent().filter(|dir| !dir.as_os_str().is_empty()) {
      self
        .fs
        .create_dir_all(dir)
        .map_err(|source| WriteError::CreateDirectory {
          path: dir.to_path_buf(),
          source,
        })?;
    }

    let _lock = StatusLock::acquire(&*self.fs, lock_path(target), &self.lock_options())?;

    let mut document = self.read_document(target)?;
    merge_fragment(&mut document, fragment, self.options.merge);

    let contents = serialize_document(&document, self.options.indent_width()).map_err(|source| {
      WriteError::Serialize {
        path: target.to_path_buf(),
        source,
      }
    })?;

    tracing::debug!("Writing status to {}", target.display());
    self
      .fs
      .write(target, &contents)
      .map_err(|source| WriteError::Write {
        path: target.to_path_buf(),
        source,
      })
  }

  /// The document currently on disk; missing or unparseable files read as empty
  fn read_document(&self, target: &Path) -> Result<JSONObject, WriteError> {
    let bytes = match self.fs.read(target) {
      Ok(bytes) => bytes,
      Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(JSONObject::new()),
      Err(source) => {
        return Err(WriteError::Read {
          path: target.to_path_buf(),
          source,
        })
      }
    };

    match serde_json::from_slice::<JSONObject>(&bytes) {
      Ok(document) => Ok(document),
      Err(error) => {
        tracing::warn!(
          "Unable to parse existing status file {}, ignoring it: {}",
          target.display(),
          error
        );
        Ok(JSONObject::new())
      }
    }
  }

  fn lock_options(&self) -> LockOptions {
    LockOptions {
      wait: self.options.lock_wait(),
      stale: self.options.lock_stale(),
    }
  }
}

impl StatusSink for StatusWriter {
  fn write_status(&self, fragment: StatusFragment, output: &OutputOptions) -> anyhow::Result<()> {
    Ok(self.write_output(fragment, output)?)
  }
}

fn serialize_document(
  document: &JSONObject,
  indent: Option<usize>,
) -> Result<Vec<u8>, serde_json::Error> {
  let Some(width) = indent else {
    return serde_json::to_vec(document);
  };

  let indent = " ".repeat(width);
  let mut contents = Vec::new();
  let mut serializer =
    Serializer::with_formatter(&mut contents, PrettyFormatter::with_indent(indent.as_bytes()));
  document.serialize(&mut serializer)?;

  Ok(contents)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::time::Duration;

  use bundle_tracker_core::types::ChunkFile;
  use bundle_tracker_core::types::ChunkMap;
  use bundle_tracker_filesystem::in_memory_file_system::InMemoryFileSystem;
  use bundle_tracker_filesystem::FileSystem;
  use bundle_tracker_filesystem::MockFileSystem;
  use pretty_assertions::assert_eq;
  use serde_json::json;
  use serde_json::Value;
  use tracing_test::traced_test;

  use super::*;
  use crate::MergeMode;

  fn writer(fs: &Arc<InMemoryFileSystem>, options: BundleTrackerOptions) -> StatusWriter {
    StatusWriter::new(fs.clone(), Arc::new(options))
  }

  fn read_json(fs: &InMemoryFileSystem, path: &str) -> Value {
    serde_json::from_slice(&fs.read(Path::new(path)).unwrap()).unwrap()
  }

  fn done(names: &[&str]) -> StatusFragment {
    StatusFragment::done(
      names
        .iter()
        .map(|name| {
          (
            name.to_string(),
            vec![ChunkFile {
              name: format!("{name}.js"),
              ..ChunkFile::default()
            }],
          )
        })
        .collect::<ChunkMap>(),
    )
  }

  #[test]
  fn compiling_then_done_ends_done_with_chunks() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(&fs, BundleTrackerOptions::new("/out"));
    let output = OutputOptions::default();

    writer
      .write_output(StatusFragment::compiling(), &output)
      .unwrap();
    writer.write_output(done(&["app"]), &output).unwrap();

    assert_eq!(
      read_json(&fs, "/out/webpack-stats.json"),
      json!({ "status": "done", "chunks": { "app": [{ "name": "app.js" }] } })
    );
    assert!(!fs.exists(Path::new("/out/webpack-stats.json.lock")));
  }

  #[test]
  fn writing_the_same_fragment_twice_is_idempotent() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(&fs, BundleTrackerOptions::new("/out"));
    let output = OutputOptions::default();

    writer.write_output(done(&["app"]), &output).unwrap();
    let once = fs.read(Path::new("/out/webpack-stats.json")).unwrap();

    writer.write_output(done(&["app"]), &output).unwrap();
    let twice = fs.read(Path::new("/out/webpack-stats.json")).unwrap();

    assert_eq!(once, twice);
  }

  #[test]
  fn chunks_fan_out_to_templated_paths() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(&fs, BundleTrackerOptions::new("/out/[name]"));
    let output = OutputOptions::default();

    writer
      .write_output(done(&["main", "vendor"]), &output)
      .unwrap();

    let expected = json!({
      "status": "done",
      "chunks": {
        "main": [{ "name": "main.js" }],
        "vendor": [{ "name": "vendor.js" }]
      }
    });
    assert_eq!(read_json(&fs, "/out/main/webpack-stats.json"), expected);
    assert_eq!(read_json(&fs, "/out/vendor/webpack-stats.json"), expected);
    assert!(!fs.exists(Path::new("/out/webpack-stats.json")));
  }

  #[test]
  #[traced_test]
  fn corrupt_documents_are_replaced() {
    let fs = Arc::new(InMemoryFileSystem::default());
    fs.write(Path::new("/out/webpack-stats.json"), b"{\"status\": \"do")
      .unwrap();
    let writer = writer(&fs, BundleTrackerOptions::new("/out"));

    writer
      .write_output(StatusFragment::compiling(), &OutputOptions::default())
      .unwrap();

    assert_eq!(
      read_json(&fs, "/out/webpack-stats.json"),
      json!({ "status": "compiling" })
    );
    assert!(logs_contain("Unable to parse existing status file"));
  }

  #[test]
  fn non_object_documents_are_replaced() {
    let fs = Arc::new(InMemoryFileSystem::default());
    fs.write(Path::new("/out/webpack-stats.json"), b"[1, 2, 3]")
      .unwrap();
    let writer = writer(&fs, BundleTrackerOptions::new("/out"));

    writer
      .write_output(StatusFragment::compiling(), &OutputOptions::default())
      .unwrap();

    assert_eq!(
      read_json(&fs, "/out/webpack-stats.json"),
      json!({ "status": "compiling" })
    );
  }

  #[test]
  fn public_path_is_injected_into_every_target() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(
      &fs,
      BundleTrackerOptions {
        public_path: Some(String::from("https://cdn.example.com/")),
        ..BundleTrackerOptions::new("/out/[name]")
      },
    );
    let output = OutputOptions {
      path: None,
      public_path: Some(String::from("/static/")),
    };

    writer.write_output(done(&["a", "b"]), &output).unwrap();

    for path in ["/out/a/webpack-stats.json", "/out/b/webpack-stats.json"] {
      assert_eq!(
        read_json(&fs, path)["publicPath"],
        json!("https://cdn.example.com/")
      );
    }
  }

  #[test]
  fn indent_pretty_prints() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(
      &fs,
      BundleTrackerOptions {
        indent: Some(2),
        ..BundleTrackerOptions::new("/out")
      },
    );

    writer
      .write_output(StatusFragment::compiling(), &OutputOptions::default())
      .unwrap();

    assert_eq!(
      String::from_utf8(fs.read(Path::new("/out/webpack-stats.json")).unwrap()).unwrap(),
      "{\n  \"status\": \"compiling\"\n}"
    );
  }

  #[test]
  fn compact_without_indent() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(&fs, BundleTrackerOptions::new("/out"));

    writer
      .write_output(StatusFragment::compiling(), &OutputOptions::default())
      .unwrap();

    assert_eq!(
      fs.read(Path::new("/out/webpack-stats.json")).unwrap(),
      br#"{"status":"compiling"}"#
    );
  }

  #[test]
  fn replace_status_mode_clears_the_previous_error() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(
      &fs,
      BundleTrackerOptions {
        merge: MergeMode::ReplaceStatus,
        ..BundleTrackerOptions::new("/out")
      },
    );
    let output = OutputOptions::default();

    writer
      .write_output(
        StatusFragment {
          message: Some(String::from("Can't resolve './missing'")),
          ..StatusFragment::error("ModuleNotFoundError")
        },
        &output,
      )
      .unwrap();
    writer.write_output(done(&["app"]), &output).unwrap();

    assert_eq!(
      read_json(&fs, "/out/webpack-stats.json"),
      json!({ "status": "done", "chunks": { "app": [{ "name": "app.js" }] } })
    );
  }

  #[test]
  #[traced_test]
  fn empty_chunk_map_writes_nothing() {
    let fs = Arc::new(InMemoryFileSystem::default());
    let writer = writer(&fs, BundleTrackerOptions::new("/out/[name]"));

    writer
      .write_output(StatusFragment::done(ChunkMap::new()), &OutputOptions::default())
      .unwrap();

    assert!(!fs.exists(Path::new("/out")));
    assert!(logs_contain("Build reported no chunks"));
  }

  #[test]
  fn lock_timeout_fails_the_write() {
    let fs = Arc::new(InMemoryFileSystem::default());
    fs.write(Path::new("/out/webpack-stats.json"), br#"{"status":"done"}"#)
      .unwrap();
    fs.create_new(Path::new("/out/webpack-stats.json.lock"))
      .unwrap();
    let writer = writer(
      &fs,
      BundleTrackerOptions {
        lock_wait: 20,
        ..BundleTrackerOptions::new("/out")
      },
    );

    let result = writer.write_output(StatusFragment::compiling(), &OutputOptions::default());

    assert!(matches!(result, Err(WriteError::LockTimeout { .. })));
    assert_eq!(
      read_json(&fs, "/out/webpack-stats.json"),
      json!({ "status": "done" })
    );
  }

  #[test]
  fn lock_is_released_when_the_write_fails() {
    let mut fs = MockFileSystem::new();
    fs.expect_create_dir_all()
      .withf(|path| path == Path::new("/out"))
      .returning(|_| Ok(()));
    fs.expect_create_new()
      .withf(|path| path == Path::new("/out/webpack-stats.json.lock"))
      .times(1)
      .returning(|_| Ok(()));
    fs.expect_read()
      .withf(|path| path == Path::new("/out/webpack-stats.json"))
      .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "missing")));
    fs.expect_write()
      .returning(|_, _| Err(io::Error::new(io::ErrorKind::StorageFull, "disk full")));
    fs.expect_remove_file()
      .withf(|path| path == Path::new("/out/webpack-stats.json.lock"))
      .times(1)
      .returning(|_| Ok(()));

    let writer = StatusWriter::new(Arc::new(fs), Arc::new(BundleTrackerOptions::new("/out")));
    let result = writer.write_output(StatusFragment::compiling(), &OutputOptions::default());

    match result {
      Err(WriteError::Write { path, source }) => {
        assert_eq!(path, PathBuf::from("/out/webpack-stats.json"));
        assert_eq!(source.kind(), io::ErrorKind::StorageFull);
      }
      other => panic!("expected a write error, got {other:?}"),
    }
  }

  #[test]
  fn directory_errors_surface_to_the_caller() {
    let fs = Arc::new(InMemoryFileSystem::default());
    fs.write(Path::new("/out"), b"not a directory").unwrap();
    let writer = writer(&fs, BundleTrackerOptions::new("/out/[name]"));

    let result = writer.write_output(done(&["app"]), &OutputOptions::default());

    assert!(matches!(result, Err(WriteError::CreateDirectory { .. })));
  }

  #[test]
  fn lock_wait_is_taken_from_options() {
    let writer = StatusWriter::new(
      Arc::new(InMemoryFileSystem::default()),
      Arc::new(BundleTrackerOptions {
        lock_wait: 1500,
        lock_stale: Some(60_000),
        ..BundleTrackerOptions::new("/out")
      }),
    );

    assert_eq!(
      writer.lock_options(),
      LockOptions {
        wait: Duration::from_millis(1500),
        stale: Some(Duration::from_secs(60)),
      }
    );
  }
}
