pub mod ansi;
pub mod plugin;
pub mod types;
