//! The two-pass reasoning protocol: segmentation, budget decisions, early
//! stop injection and stream consumption.

pub mod budget;
pub mod consumer;
pub mod early_stop;
pub mod segment;

pub use budget::BudgetDecision;
pub use consumer::{consume_stream, ChannelDelta, PassKind, StreamConsumer};
pub use early_stop::{inject, EARLY_STOP_DIRECTIVE};
pub use segment::{has_marker, split, BOUNDARY_MARKER};
