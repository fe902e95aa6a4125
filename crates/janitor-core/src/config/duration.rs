//! Human-friendly durations (`30d`, `2w`, `1h30m`, `300ms`)

use crate::error::{Error, Result};
use std::time::Duration;

/// Parse a duration such as `30d`, `1d12h` or `720h0m0s`
///
/// Units and their long forms (`30days`, `2weeks`) follow `humantime`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    humantime::parse_duration(s)
        .map_err(|e| Error::configuration(format!("invalid duration {:?}: {}", s, e)))
}
