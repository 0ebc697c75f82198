//! Terminal output helpers

pub mod spinner;

use std::time::Duration;

use console::{StyledObject, style};

pub use spinner::CommandSpinner;

/// Whole-second human duration, e.g. `2m 5s`
pub fn format_elapsed(elapsed: Duration) -> String {
    humantime::format_duration(Duration::from_secs(elapsed.as_secs())).to_string()
}

/// Green for exit 0, red otherwise
pub fn exit_code_style(code: i32) -> StyledObject<String> {
    let text = code.to_string();
    if code == 0 {
        style(text).green()
    } else {
        style(text).red()
    }
}
