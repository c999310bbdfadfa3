//! Synthetic close of a truncated reasoning phase.

use super::segment::BOUNDARY_MARKER;

/// Directive appended to reasoning that ran out of budget. The endpoint has no
/// "stop thinking" instruction, so the close is written into the assistant's
/// own turn. Must end with [`BOUNDARY_MARKER`].
pub const EARLY_STOP_DIRECTIVE: &str = concat!(
    "\n\nConsidering the limited time by the user, I have to give the solution ",
    "based on the thinking directly now.\n</think>"
);

/// Append [`EARLY_STOP_DIRECTIVE`] to `text`.
pub fn inject(text: &str) -> String {
    debug_assert!(EARLY_STOP_DIRECTIVE.ends_with(BOUNDARY_MARKER));
    let mut out = String::with_capacity(text.len() + EARLY_STOP_DIRECTIVE.len());
    out.push_str(text);
    out.push_str(EARLY_STOP_DIRECTIVE);
    out
}
