//! Live session events for the surrounding shell.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::protocol::PassKind;
use crate::types::Termination;

use super::turn::TurnOutcome;

/// Callback receiving [`SessionEvent`]s in order.
pub type SessionEventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Events emitted while a user turn is processed.
///
/// `ReasoningDelta` and `EarlyStopInjected` belong to the reasoning progress
/// channel; `AnswerDelta` to the answer progress channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PassStarted {
        pass: PassKind,
        token_limit: u32,
    },
    ReasoningDelta {
        text: String,
    },
    /// The synthetic close appended to truncated reasoning.
    EarlyStopInjected {
        directive: String,
    },
    AnswerDelta {
        text: String,
    },
    PassFinished {
        pass: PassKind,
        termination: Option<Termination>,
    },
    TurnCommitted {
        outcome: TurnOutcome,
    },
    TurnFailed {
        error: String,
    },
}
