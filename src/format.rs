//! Small formatting helpers for pages and templates.

use chrono::DateTime;

const PRETTY_DATE: &str = "%Y-%m-%d at %I:%M:%S%p";

/// Formats a Unix timestamp (seconds) as `2006-01-02 at 03:04:05PM`.
///
/// Always rendered in UTC, never the host's local zone, so the same
/// timestamp reads the same on every machine and in every test run. Convert
/// with [`chrono::Local`] first if a page must show local time.
///
/// `0` means "never set" and, like timestamps chrono cannot represent,
/// renders as `N/A`.
pub fn pretty_date(unix_secs: i64) -> String {
    if unix_secs == 0 {
        return "N/A".to_owned();
    }
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(t) => t.format(PRETTY_DATE).to_string(),
        None => "N/A".to_owned(),
    }
}

/// CSS class for a media file: animated formats are `gifs`, the rest `imgs`.
pub fn media_class(name: &str) -> &'static str {
    match media_ext(name) {
        "" => "imgs",
        _ => "gifs",
    }
}

/// Extension of an animated media file (`gif` or `webm`), else `""`.
pub fn media_ext(name: &str) -> &'static str {
    if name.ends_with(".gif") {
        "gif"
    } else if name.ends_with(".webm") {
        "webm"
    } else {
        ""
    }
}
