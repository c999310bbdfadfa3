//! Generation requests and termination reasons.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::message::Turn;

/// A single bounded invocation of the generation endpoint.
///
/// Built once per pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    transcript: Vec<Turn>,
    token_limit: u32,
    reasoning_enabled: bool,
}

impl GenerationRequest {
    pub fn new(transcript: Vec<Turn>, token_limit: u32, reasoning_enabled: bool) -> Self {
        Self {
            transcript,
            token_limit,
            reasoning_enabled,
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn token_limit(&self) -> u32 {
        self.token_limit
    }

    pub fn reasoning_enabled(&self) -> bool {
        self.reasoning_enabled
    }
}

/// Why a stream finished, as reported on its final chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Termination {
    /// The model concluded on its own.
    NaturalStop,
    /// The token limit of the request was reached.
    LengthLimit,
    /// Any other explicit reason (content filter, abort, ...).
    Other,
}

impl Termination {
    /// Map an OpenAI-style `finish_reason`.
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "stop" | "eos" => Self::NaturalStop,
            "length" | "max_tokens" => Self::LengthLimit,
            _ => Self::Other,
        }
    }
}
