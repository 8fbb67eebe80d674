// Clock module - Time source for row timestamps

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::fmt::Write;

/// Timestamp pattern used when none is configured
pub const DEFAULT_DATE_FORMAT: &str = "%m-%d-%Y %T";

/// Source of formatted wall-clock timestamps
pub trait Clock {
    /// Format the current time with a strftime-style pattern
    fn format_now(&self, pattern: &str) -> String;
}

/// Clock reading the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn format_now(&self, pattern: &str) -> String {
        let now = Local::now();
        let mut out = String::new();

        // chrono reports a formatting error for patterns it cannot render
        if write!(out, "{}", now.format(pattern)).is_err() {
            tracing::warn!("Cannot render date format '{}', using default", pattern);
            out.clear();
            let _ = write!(out, "{}", now.format(DEFAULT_DATE_FORMAT));
        }

        out
    }
}

/// Check that a strftime pattern contains only specifiers chrono understands
pub fn is_valid_date_format(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}
