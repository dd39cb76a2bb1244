pub use self::build::*;
pub use self::json::*;
pub use self::output_options::*;
pub use self::status::*;

mod build;
mod json;
mod output_options;
mod status;
