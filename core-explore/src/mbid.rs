//! MusicBrainz identifier shape check.

use once_cell::sync::Lazy;
use regex::Regex;

static MBID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("MBID pattern is a valid regex")
});

/// Whether `value` has the canonical MBID form: lowercase hex, 8-4-4-4-12.
///
/// Only the shape is checked; the id may still be unknown to MusicBrainz.
pub fn is_mbid(value: &str) -> bool {
    MBID_PATTERN.is_match(value)
}
