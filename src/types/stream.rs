//! Streaming types.

use serde::{Deserialize, Serialize};

use super::generation::Termination;

/// One incremental chunk delivered by the endpoint.
///
/// Older endpoints put everything in `content`; newer ones split the
/// deliberation into `reasoning`. Either fragment may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Terminal status, only present on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<Termination>,
}

impl StreamChunk {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn finished(reason: Termination) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Default::default()
        }
    }
}

/// Outcome of consuming one pass, normalized to two channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamResult {
    pub reasoning: String,
    pub answer: String,
    /// `None` when the stream ended without an explicit terminal status.
    pub termination: Option<Termination>,
}

impl StreamResult {
    /// Reasoning followed by answer, the text as the model produced it.
    pub fn combined_text(&self) -> String {
        let mut text = String::with_capacity(self.reasoning.len() + self.answer.len());
        text.push_str(&self.reasoning);
        text.push_str(&self.answer);
        text
    }

    pub fn hit_length_limit(&self) -> bool {
        self.termination == Some(Termination::LengthLimit)
    }
}
