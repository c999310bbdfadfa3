//! Generation endpoint trait and implementations.

pub mod http;
pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleEndpoint;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{GenerationRequest, StreamChunk};

/// A remote text-generation endpoint that streams reasoning and answer text.
#[async_trait]
pub trait GenerationEndpoint: Send + Sync {
    /// Model identifier sent with each request.
    fn model_id(&self) -> &str;

    /// Start a streaming generation.
    ///
    /// Failing to connect, a non-success status, or an unreadable first
    /// payload are reported here or as the first stream item; the caller
    /// never receives a partial result for a failed call.
    async fn open_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>>;
}
