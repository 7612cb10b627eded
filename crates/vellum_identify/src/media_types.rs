//! Media type to extension tables.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Maps a media type to its candidate format extensions, preferred first.
pub type MediaTypes = HashMap<String, Vec<String>>;

const SYSTEM_MIME_TYPES: &str = "/etc/mime.types";

static SYSTEM_MEDIA_TYPES: LazyLock<MediaTypes> = LazyLock::new(|| {
    match std::fs::read_to_string(SYSTEM_MIME_TYPES) {
        Ok(data) => parse_mime_types(&data),
        Err(e) => {
            tracing::debug!(path = SYSTEM_MIME_TYPES, error = %e, "System media types unavailable");
            MediaTypes::new()
        }
    }
});

/// The system table, read once from `/etc/mime.types`.
///
/// Empty when the file is missing or unreadable.
pub fn system_media_types() -> &'static MediaTypes {
    &SYSTEM_MEDIA_TYPES
}

/// Parse a `mime.types` style document.
///
/// Each non-comment line is a media type followed by zero or more extensions.
/// A media type listed twice keeps its last entry.
///
/// # Examples
///
/// ```
/// use vellum_identify::parse_mime_types;
///
/// let table = parse_mime_types("# comment\nimage/jpeg\tjpeg jpg jpe\ntext/plain txt\n");
/// assert_eq!(table["image/jpeg"], ["jpeg", "jpg", "jpe"]);
/// assert_eq!(table["text/plain"], ["txt"]);
/// ```
pub fn parse_mime_types(data: &str) -> MediaTypes {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let media_type = fields.next()?;
            Some((
                media_type.to_string(),
                fields.map(str::to_string).collect(),
            ))
        })
        .collect()
}

/// The system table with `overrides` laid over it.
///
/// Override entries replace system entries for the same media type wholesale.
pub fn merge_media_types(overrides: &MediaTypes) -> MediaTypes {
    let mut merged = system_media_types().clone();
    merged.extend(
        overrides
            .iter()
            .map(|(media_type, extensions)| (media_type.clone(), extensions.clone())),
    );
    merged
}
