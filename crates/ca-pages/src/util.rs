//! Formatting and file helpers.

use ca_core::Result;
use chrono::{DateTime, Local, TimeDelta, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Uppercase the first character, leaving the rest untouched
#[must_use]
pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Write `parts` one after another into `path`.
///
/// Nothing is left behind at `path` if writing fails midway.
pub fn download_file<P, I, B>(parts: I, path: P) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let path = path.as_ref();

    let written = File::create(path).and_then(|mut file| {
        for part in parts {
            file.write_all(part.as_ref())?;
        }
        file.flush()
    });

    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "download failed");
        if let Err(cleanup) = std::fs::remove_file(path) {
            debug!(error = %cleanup, "no partial download to remove");
        }
        return Err(e.into());
    }

    debug!(path = %path.display(), "download written");
    Ok(())
}

/// `date` moved by `days`, which may be negative; `None` if out of range
#[must_use]
pub fn add_days(date: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

/// Render an RFC 3339 timestamp in local time, or echo it if it won't parse
#[must_use]
pub fn format_timestamp(value: &str) -> String {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| value.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}
