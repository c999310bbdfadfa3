//! Reasoning/answer segmentation.

/// Literal that closes the reasoning phase inside a text blob.
pub const BOUNDARY_MARKER: &str = "</think>";

/// Split `text` at the last [`BOUNDARY_MARKER`].
///
/// The reasoning part keeps the marker; the answer part is everything after
/// it. Without a marker the whole blob is reasoning. Earlier occurrences (a
/// model quoting the tag, for instance) never close the phase.
pub fn split(text: &str) -> (&str, &str) {
    match text.rfind(BOUNDARY_MARKER) {
        Some(idx) => text.split_at(idx + BOUNDARY_MARKER.len()),
        None => (text, ""),
    }
}

/// Whether `text` contains the marker anywhere.
pub fn has_marker(text: &str) -> bool {
    text.contains(BOUNDARY_MARKER)
}
