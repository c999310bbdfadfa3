//! Provisional assistant turn and per-turn outcome.

use serde::{Deserialize, Serialize};

use crate::protocol::{inject, split, EARLY_STOP_DIRECTIVE};
use crate::types::Turn;

/// Assistant text accumulated across the passes of one user turn.
///
/// Owned by the session for the lifetime of the turn and converted into an
/// immutable [`Turn`] only at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurnBuilder {
    text: String,
    early_stopped: bool,
}

impl AssistantTurnBuilder {
    /// Start from the first pass's combined reasoning and answer text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            early_stopped: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn early_stopped(&self) -> bool {
        self.early_stopped
    }

    /// Close the reasoning phase with the early-stop directive and return the
    /// injected text.
    pub fn inject_early_stop(&mut self) -> &'static str {
        self.text = inject(&self.text);
        self.early_stopped = true;
        EARLY_STOP_DIRECTIVE
    }

    /// Text after the last boundary marker.
    pub fn answer_so_far(&self) -> &str {
        split(&self.text).1
    }

    /// The turn as sent to the endpoint for a continuation pass.
    pub fn provisional(&self) -> Turn {
        Turn::assistant(self.text.clone())
    }

    pub fn append(&mut self, continuation: &str) {
        self.text.push_str(continuation);
    }

    pub fn commit(self) -> Turn {
        Turn::assistant(self.text)
    }
}

/// What happened while a user turn was processed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Committed assistant text: reasoning, any directive, then the answer.
    pub text: String,
    /// Endpoint passes used (1 or 2).
    pub passes: u8,
    /// Reasoning was closed with the early-stop directive.
    pub early_stopped: bool,
    /// The final pass also hit its limit; the answer is cut short.
    pub answer_truncated: bool,
    /// A pass ended without an explicit terminal status.
    pub termination_unknown: bool,
}
