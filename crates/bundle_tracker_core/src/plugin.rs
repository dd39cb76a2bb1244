use std::sync::Arc;

use crate::types::BuildStats;
use crate::types::ModuleFailure;
use crate::types::OutputOptions;
use crate::types::StatusFragment;

/// Lifecycle events the bundler emits during a build
#[derive(Clone, Debug, PartialEq)]
pub enum BuildEvent {
  /// A new compilation has started
  BuildStart,
  /// A single module failed; the build carries on
  ModuleFailure(ModuleFailure),
  /// The build finished, successfully or with fatal errors
  BuildComplete(BuildStats),
}

/// The three callback slots a host bundler registers an observer against.
///
/// Callbacks run synchronously on the bundler's thread. Errors returned from
/// them are failures of the observer itself, never of the build it observes.
pub trait BuildObserver: std::fmt::Debug {
  fn on_build_start(&self, output: &OutputOptions) -> anyhow::Result<()>;

  fn on_module_failure(
    &self,
    output: &OutputOptions,
    failure: &ModuleFailure,
  ) -> anyhow::Result<()>;

  fn on_build_complete(&self, output: &OutputOptions, stats: &BuildStats) -> anyhow::Result<()>;

  /// Route an event to the matching callback
  fn report(&self, output: &OutputOptions, event: &BuildEvent) -> anyhow::Result<()> {
    match event {
      BuildEvent::BuildStart => self.on_build_start(output),
      BuildEvent::ModuleFailure(failure) => self.on_module_failure(output, failure),
      BuildEvent::BuildComplete(stats) => self.on_build_complete(output, stats),
    }
  }
}

pub type BuildObserverRef = Arc<dyn BuildObserver + Send + Sync>;

/// Destination for status fragments
#[mockall::automock]
pub trait StatusSink: std::fmt::Debug {
  fn write_status(&self, fragment: StatusFragment, output: &OutputOptions) -> anyhow::Result<()>;
}

pub type StatusSinkRef = Arc<dyn StatusSink + Send + Sync>;
