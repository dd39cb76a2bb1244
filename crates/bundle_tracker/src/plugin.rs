use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use bundle_tracker_core::ansi::strip_ansi;
use bundle_tracker_core::plugin::BuildObserver;
use bundle_tracker_core::plugin::StatusSinkRef;
use bundle_tracker_core::types::BuildError;
use bundle_tracker_core::types::BuildStats;
use bundle_tracker_core::types::ChunkFile;
use bundle_tracker_core::types::ChunkMap;
use bundle_tracker_core::types::ErrorDetails;
use bundle_tracker_core::types::ModuleFailure;
use bundle_tracker_core::types::OutputOptions;
use bundle_tracker_core::types::StatusFragment;
use bundle_tracker_filesystem::FileSystemRef;

use crate::BundleTrackerOptions;
use crate::OptionsError;
use crate::StatusWriter;

/// Error kind recorded when the bundler's error has no name
pub const UNKNOWN_ERROR: &str = "unknown-error";

/// Observes the build lifecycle and records it in the status file
#[derive(Debug)]
pub struct BundleTrackerPlugin {
  options: Arc<BundleTrackerOptions>,
  sink: StatusSinkRef,
}

impl BundleTrackerPlugin {
  pub fn new(options: BundleTrackerOptions, fs: FileSystemRef) -> Result<Self, OptionsError> {
    options.validate()?;

    let options = Arc::new(options);
    let sink: StatusSinkRef = Arc::new(StatusWriter::new(fs, options.clone()));

    Ok(Self { options, sink })
  }

  /// Send fragments somewhere other than the status file
  pub fn with_sink(
    options: BundleTrackerOptions,
    sink: StatusSinkRef,
  ) -> Result<Self, OptionsError> {
    options.validate()?;

    Ok(Self {
      options: Arc::new(options),
      sink,
    })
  }

  pub fn module_failure_fragment(&self, failure: &ModuleFailure) -> StatusFragment {
    let error = &failure.error;

    StatusFragment {
      file: error.user_request().map(String::from),
      message: error
        .details
        .as_ref()
        .and_then(ErrorDetails::rendered)
        .map(|message| strip_ansi(message).into_owned()),
      ..StatusFragment::error(error_kind(error))
    }
  }

  pub fn build_complete_fragment(
    &self,
    output: &OutputOptions,
    stats: &BuildStats,
  ) -> StatusFragment {
    if let Some(error) = stats.errors.first() {
      return StatusFragment {
        message: error
          .message
          .as_deref()
          .or_else(|| error.details.as_ref().and_then(ErrorDetails::rendered))
          .map(|message| strip_ansi(message).into_owned()),
        ..StatusFragment::error(error_kind(error))
      };
    }

    let public_path = self.options.resolve_public_path(output);
    let chunks = stats
      .chunks
      .iter()
      .map(|chunk| {
        let files = chunk
          .files
          .iter()
          .map(|file| chunk_file(file, public_path, output))
          .collect();
        (chunk.name.clone(), files)
      })
      .collect::<ChunkMap>();

    let mut fragment = StatusFragment::done(chunks);
    if self.options.log_time {
      fragment.start_time = stats.start_time;
      fragment.end_time = stats.end_time;
    }

    fragment
  }
}

fn error_kind(error: &BuildError) -> &str {
  error
    .name
    .as_deref()
    .filter(|name| !name.is_empty())
    .unwrap_or(UNKNOWN_ERROR)
}

fn chunk_file(file: &str, public_path: Option<&str>, output: &OutputOptions) -> ChunkFile {
  ChunkFile {
    name: file.to_string(),
    public_path: public_path.map(|base| format!("{base}{file}")),
    path: output
      .path
      .as_ref()
      .map(|dir| output_path(dir, file).display().to_string()),
  }
}

/// `file` resolved inside `dir` with `.` and `..` folded away. A root or
/// prefix on `file` is ignored, so it never replaces `dir`.
fn output_path(dir: &Path, file: &str) -> PathBuf {
  let file = Path::new(file)
    .components()
    .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)));

  let mut path = PathBuf::new();
  for component in dir.components().chain(file) {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match path.components().next_back() {
        Some(Component::Normal(_)) => {
          path.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => path.push(".."),
      },
      other => path.push(other),
    }
  }

  path
}

impl BuildObserver for BundleTrackerPlugin {
  #[tracing::instrument(level = "debug", skip_all, fields(plugin = "BundleTrackerPlugin"))]
  fn on_build_start(&self, output: &OutputOptions) -> anyhow::Result<()> {
    self.sink.write_status(StatusFragment::compiling(), output)
  }

  #[tracing::instrument(level = "debug", skip_all, fields(plugin = "BundleTrackerPlugin"))]
  fn on_module_failure(
    &self,
    output: &OutputOptions,
    failure: &ModuleFailure,
  ) -> anyhow::Result<()> {
    tracing::debug!(
      "Module {} failed",
      failure.error.user_request().unwrap_or("<unknown>")
    );

    self
      .sink
      .write_status(self.module_failure_fragment(failure), output)
  }

  #[tracing::instrument(level = "debug", skip_all, fields(plugin = "BundleTrackerPlugin"))]
  fn on_build_complete(&self, output: &OutputOptions, stats: &BuildStats) -> anyhow::Result<()> {
    self
      .sink
      .write_status(self.build_complete_fragment(output, stats), output)
  }
}
