//! Convenience re-exports for common use.

pub use crate::config::SessionConfig;
pub use crate::error::{Result, ThinkcapError};
pub use crate::protocol::{BudgetDecision, PassKind, BOUNDARY_MARKER};
pub use crate::provider::{GenerationEndpoint, OpenAiCompatibleEndpoint};
pub use crate::session::{Session, SessionEvent, SessionEventSink, TurnOutcome};
pub use crate::types::{GenerationRequest, Role, StreamChunk, StreamResult, Termination, Transcript, Turn};
