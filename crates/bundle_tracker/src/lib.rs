//! Records the progress of a bundler build into a JSON status file.
//!
//! [`BundleTrackerPlugin`] observes the build lifecycle and turns each event
//! into a [`StatusFragment`](bundle_tracker_core::types::StatusFragment).
//! [`StatusWriter`] merges fragments into the status file on disk while
//! holding a lock, so that several bundler processes can share one file.
pub use self::error::*;
pub use self::options::*;
pub use self::plugin::*;
pub use self::writer::StatusWriter;

mod error;
mod options;
mod plugin;
pub mod writer;
