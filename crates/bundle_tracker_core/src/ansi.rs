//! Removal of terminal color and control sequences from diagnostics
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches CSI sequences (colors, cursor movement) and OSC sequences
/// terminated by BEL (hyperlinks, window titles).
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(concat!(
    r"[\x1B\x{9B}][\[\]()#;?]*",
    r"(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*",
    r"|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)",
    r"|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
  ))
  .expect("ANSI escape pattern is valid")
});

pub fn strip_ansi(input: &str) -> Cow<'_, str> {
  ANSI_ESCAPE.replace_all(input, "")
}
