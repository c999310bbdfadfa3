//! Stream consumption: channel normalization, live surfacing, termination.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, ThinkcapError};
use crate::provider::GenerationEndpoint;
use crate::types::{GenerationRequest, StreamChunk, StreamResult, Termination};

use super::segment::{split, BOUNDARY_MARKER};

/// Which pass of a turn is being consumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PassKind {
    /// Bounded by the thinking budget; reasoning surfaces live, answer text
    /// is held back until the pass has been segmented.
    Thinking,
    /// Extends a provisional assistant turn whose reasoning is already closed.
    Continuation,
    /// Zero-budget mode: reasoning disabled, a single answer stream.
    Direct,
}

impl PassKind {
    fn starts_in_reasoning(self) -> bool {
        matches!(self, Self::Thinking)
    }

    fn surfaces(self, delta: &ChannelDelta) -> bool {
        match delta {
            ChannelDelta::Reasoning(_) => matches!(self, Self::Thinking),
            ChannelDelta::Answer(_) => !matches!(self, Self::Thinking),
        }
    }
}

/// A fragment routed to one of the two logical channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelDelta {
    Reasoning(String),
    Answer(String),
}

/// How the endpoint delivers reasoning, decided from the first chunk that
/// carries text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelShape {
    /// Reasoning arrives in its own field; the endpoint strips the marker.
    Separate,
    /// Everything arrives as content; the marker splits the channels.
    Interleaved,
    /// Reasoning disabled for the request.
    AnswerOnly,
}

/// Routes chunk fragments into reasoning and answer text.
#[derive(Debug)]
struct ChannelRouter {
    shape: Option<ChannelShape>,
    reasoning_open: bool,
    reasoning: String,
    answer: String,
}

impl ChannelRouter {
    fn new(reasoning_enabled: bool, reasoning_open: bool) -> Self {
        Self {
            shape: (!reasoning_enabled).then_some(ChannelShape::AnswerOnly),
            reasoning_open: reasoning_enabled && reasoning_open,
            reasoning: String::new(),
            answer: String::new(),
        }
    }

    fn route(&mut self, chunk: StreamChunk, out: &mut Vec<ChannelDelta>) {
        let reasoning = chunk.reasoning.filter(|s| !s.is_empty());
        let content = chunk.content.filter(|s| !s.is_empty());

        let shape = match self.shape {
            Some(shape) => shape,
            None if reasoning.is_some() => self.select(ChannelShape::Separate),
            None if content.is_some() => self.select(ChannelShape::Interleaved),
            None => return,
        };

        match shape {
            ChannelShape::AnswerOnly => {
                if let Some(text) = content {
                    self.push_answer(text, out);
                }
            }
            ChannelShape::Separate => {
                if let Some(text) = reasoning {
                    self.push_reasoning(text, out);
                }
                if let Some(text) = content {
                    if self.reasoning_open {
                        self.close_reasoning(out);
                    }
                    self.push_answer(text, out);
                }
            }
            ChannelShape::Interleaved => {
                if let Some(text) = reasoning {
                    self.push_reasoning(text, out);
                }
                if let Some(text) = content {
                    self.route_interleaved(text, out);
                }
            }
        }
    }

    fn select(&mut self, shape: ChannelShape) -> ChannelShape {
        debug!(?shape, "selected stream channel shape");
        self.shape = Some(shape);
        shape
    }

    fn push_reasoning(&mut self, text: String, out: &mut Vec<ChannelDelta>) {
        if !self.reasoning_open {
            debug!(len = text.len(), "dropping reasoning fragment after reasoning closed");
            return;
        }
        self.reasoning.push_str(&text);
        out.push(ChannelDelta::Reasoning(text));
    }

    fn push_answer(&mut self, text: String, out: &mut Vec<ChannelDelta>) {
        self.answer.push_str(&text);
        out.push(ChannelDelta::Answer(text));
    }

    fn close_reasoning(&mut self, out: &mut Vec<ChannelDelta>) {
        if !self.reasoning.ends_with(BOUNDARY_MARKER) {
            self.reasoning.push_str(BOUNDARY_MARKER);
            out.push(ChannelDelta::Reasoning(BOUNDARY_MARKER.to_string()));
        }
        self.reasoning_open = false;
    }

    fn route_interleaved(&mut self, text: String, out: &mut Vec<ChannelDelta>) {
        if !self.reasoning_open {
            self.push_answer(text, out);
            return;
        }

        // The marker may straddle the previous fragment.
        let mut search_from = self.reasoning.len().saturating_sub(BOUNDARY_MARKER.len() - 1);
        while !self.reasoning.is_char_boundary(search_from) {
            search_from -= 1;
        }
        let fragment_start = self.reasoning.len();
        self.reasoning.push_str(&text);

        let Some(found) = self.reasoning[search_from..].find(BOUNDARY_MARKER) else {
            out.push(ChannelDelta::Reasoning(text));
            return;
        };

        let close = search_from + found + BOUNDARY_MARKER.len();
        let tail = self.reasoning.split_off(close);
        self.reasoning_open = false;
        out.push(ChannelDelta::Reasoning(
            self.reasoning[fragment_start..].to_string(),
        ));
        if !tail.is_empty() {
            self.push_answer(tail, out);
        }
    }

    fn finish(self, termination: Option<Termination>) -> StreamResult {
        StreamResult {
            reasoning: self.reasoning,
            answer: self.answer,
            termination,
        }
    }
}

/// Runs one pass against an endpoint and normalizes its stream.
pub struct StreamConsumer<'a> {
    endpoint: &'a dyn GenerationEndpoint,
}

impl<'a> StreamConsumer<'a> {
    pub fn new(endpoint: &'a dyn GenerationEndpoint) -> Self {
        Self { endpoint }
    }

    /// Open a stream for `request` and drain it.
    ///
    /// Deltas the pass kind surfaces live are handed to `on_delta` in arrival
    /// order. Any failure, including cancellation, discards the pass.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        pass: PassKind,
        cancel: &CancellationToken,
        on_delta: &mut (dyn FnMut(ChannelDelta) + Send),
    ) -> Result<StreamResult> {
        if request.token_limit() == 0 {
            return Err(ThinkcapError::InvalidArgument(
                "token limit must be positive".into(),
            ));
        }

        debug!(
            model = self.endpoint.model_id(),
            %pass,
            token_limit = request.token_limit(),
            reasoning = request.reasoning_enabled(),
            turns = request.transcript().len(),
            "opening stream"
        );

        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ThinkcapError::Cancelled),
            opened = self.endpoint.open_stream(request) => opened?,
        };

        consume_stream(stream, request.reasoning_enabled(), pass, cancel, on_delta).await
    }
}

/// Drain an already opened stream into a [`StreamResult`].
pub async fn consume_stream(
    mut stream: BoxStream<'static, Result<StreamChunk>>,
    reasoning_enabled: bool,
    pass: PassKind,
    cancel: &CancellationToken,
    on_delta: &mut (dyn FnMut(ChannelDelta) + Send),
) -> Result<StreamResult> {
    let mut router = ChannelRouter::new(reasoning_enabled, pass.starts_in_reasoning());
    let mut termination = None;
    let mut routed = Vec::new();

    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ThinkcapError::Cancelled),
            item = stream.next() => item,
        };
        let Some(item) = item else { break };

        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) if termination.is_some() => {
                warn!(error = %e, "stream failed after terminal status, keeping pass output");
                break;
            }
            Err(e) => return Err(e),
        };

        if let Some(reason) = chunk.finish_reason {
            termination = Some(reason);
        }

        router.route(chunk, &mut routed);
        for delta in routed.drain(..) {
            if pass.surfaces(&delta) {
                on_delta(delta);
            }
        }
    }

    if termination.is_none() {
        warn!(%pass, "stream ended without a terminal status");
    }

    let surfaced = router.reasoning.len();
    let mut result = router.finish(termination);
    if matches!(pass, PassKind::Thinking) {
        resegment(&mut result, surfaced, on_delta);
    }
    Ok(result)
}

/// Re-split a thinking pass at the last marker.
///
/// Live routing closes reasoning at the first marker it sees, so reasoning
/// that quotes the marker is only complete once the pass has ended. Text
/// between the first and last marker is surfaced here as reasoning.
fn resegment(
    result: &mut StreamResult,
    surfaced: usize,
    on_delta: &mut (dyn FnMut(ChannelDelta) + Send),
) {
    let combined = result.combined_text();
    let (reasoning, answer) = split(&combined);
    if let Some(rest) = reasoning.get(surfaced..).filter(|rest| !rest.is_empty()) {
        on_delta(ChannelDelta::Reasoning(rest.to_string()));
    }
    result.reasoning = reasoning.to_string();
    result.answer = answer.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn boxed(chunks: Vec<Result<StreamChunk>>) -> BoxStream<'static, Result<StreamChunk>> {
        Box::pin(futures::stream::iter(chunks))
    }

    async fn drain(
        chunks: Vec<Result<StreamChunk>>,
        reasoning_enabled: bool,
        pass: PassKind,
    ) -> (Result<StreamResult>, Vec<ChannelDelta>) {
        let mut seen = Vec::new();
        let result = consume_stream(
            boxed(chunks),
            reasoning_enabled,
            pass,
            &CancellationToken::new(),
            &mut |delta| seen.push(delta),
        )
        .await;
        (result, seen)
    }

    #[tokio::test]
    async fn separate_channels_close_reasoning_with_marker() {
        let (result, seen) = drain(
            vec![
                Ok(StreamChunk::reasoning("2+2")),
                Ok(StreamChunk::reasoning(" is 4")),
                Ok(StreamChunk::content("4.")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
            ],
            true,
            PassKind::Thinking,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.reasoning, "2+2 is 4</think>");
        assert_eq!(result.answer, "4.");
        assert_eq!(result.termination, Some(Termination::NaturalStop));
        assert_eq!(
            seen,
            vec![
                ChannelDelta::Reasoning("2+2".into()),
                ChannelDelta::Reasoning(" is 4".into()),
                ChannelDelta::Reasoning("</think>".into()),
            ]
        );
    }

    #[tokio::test]
    async fn interleaved_marker_across_chunks_is_found() {
        let (result, seen) = drain(
            vec![
                Ok(StreamChunk::content("thinking</th")),
                Ok(StreamChunk::content("ink>The ans")),
                Ok(StreamChunk::content("wer")),
                Ok(StreamChunk::finished(Termination::LengthLimit)),
            ],
            true,
            PassKind::Thinking,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.reasoning, "thinking</think>");
        assert_eq!(result.answer, "The answer");
        assert_eq!(
            seen,
            vec![
                ChannelDelta::Reasoning("thinking</th".into()),
                ChannelDelta::Reasoning("ink>".into()),
            ]
        );
    }

    #[tokio::test]
    async fn quoted_marker_stays_in_reasoning() {
        let (result, seen) = drain(
            vec![
                Ok(StreamChunk::content("The tag </think> ends thoughts.")),
                Ok(StreamChunk::content(" Done.</think>Final.")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
            ],
            true,
            PassKind::Thinking,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.reasoning, "The tag </think> ends thoughts. Done.</think>");
        assert_eq!(result.answer, "Final.");
        assert_eq!(
            seen,
            vec![
                ChannelDelta::Reasoning("The tag </think>".into()),
                ChannelDelta::Reasoning(" ends thoughts. Done.</think>".into()),
            ]
        );
    }

    #[tokio::test]
    async fn interleaved_without_marker_is_all_reasoning() {
        let (result, _) = drain(
            vec![
                Ok(StreamChunk::content("step one, ")),
                Ok(StreamChunk {
                    content: Some("step two".into()),
                    finish_reason: Some(Termination::LengthLimit),
                    ..Default::default()
                }),
            ],
            true,
            PassKind::Thinking,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.reasoning, "step one, step two");
        assert_eq!(result.answer, "");
        assert!(result.hit_length_limit());
    }

    #[tokio::test]
    async fn continuation_surfaces_answer_only() {
        let (result, seen) = drain(
            vec![
                Ok(StreamChunk::reasoning("stray")),
                Ok(StreamChunk::content("The answer ")),
                Ok(StreamChunk::content("is 42.")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
            ],
            true,
            PassKind::Continuation,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.answer, "The answer is 42.");
        assert_eq!(result.reasoning, "");
        assert_eq!(
            seen,
            vec![
                ChannelDelta::Answer("The answer ".into()),
                ChannelDelta::Answer("is 42.".into()),
            ]
        );
    }

    #[tokio::test]
    async fn continuation_interleaved_marker_text_is_answer() {
        let (result, _) = drain(
            vec![
                Ok(StreamChunk::content("use </think> literally")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
            ],
            true,
            PassKind::Continuation,
        )
        .await;

        assert_eq!(result.unwrap().answer, "use </think> literally");
    }

    #[tokio::test]
    async fn answer_only_ignores_reasoning_fields() {
        let (result, seen) = drain(
            vec![
                Ok(StreamChunk::reasoning("ignored")),
                Ok(StreamChunk::content("Hello")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
            ],
            false,
            PassKind::Direct,
        )
        .await;

        let result = result.unwrap();
        assert_eq!(result.reasoning, "");
        assert_eq!(result.answer, "Hello");
        assert_eq!(seen, vec![ChannelDelta::Answer("Hello".into())]);
    }

    #[tokio::test]
    async fn missing_terminal_status_is_reported_as_none() {
        let (result, _) = drain(
            vec![Ok(StreamChunk::reasoning("cut off"))],
            true,
            PassKind::Thinking,
        )
        .await;

        assert_eq!(result.unwrap().termination, None);
    }

    #[tokio::test]
    async fn error_before_terminal_status_fails_the_pass() {
        let (result, _) = drain(
            vec![
                Ok(StreamChunk::reasoning("partial")),
                Err(ThinkcapError::Stream("connection reset".into())),
            ],
            true,
            PassKind::Thinking,
        )
        .await;

        assert!(matches!(result, Err(ThinkcapError::Stream(_))));
    }

    #[tokio::test]
    async fn error_after_terminal_status_keeps_output() {
        let (result, _) = drain(
            vec![
                Ok(StreamChunk::content("done")),
                Ok(StreamChunk::finished(Termination::NaturalStop)),
                Err(ThinkcapError::Stream("trailing garbage".into())),
            ],
            false,
            PassKind::Direct,
        )
        .await;

        assert_eq!(result.unwrap().answer, "done");
    }

    #[tokio::test]
    async fn cancelled_token_discards_pass() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = consume_stream(
            boxed(vec![Ok(StreamChunk::content("x"))]),
            true,
            PassKind::Thinking,
            &cancel,
            &mut |_| {},
        )
        .await;

        assert!(matches!(result, Err(ThinkcapError::Cancelled)));
    }

    #[test]
    fn empty_fragments_do_not_select_a_shape() {
        let mut router = ChannelRouter::new(true, true);
        let mut out = Vec::new();
        router.route(
            StreamChunk {
                reasoning: Some(String::new()),
                content: Some(String::new()),
                finish_reason: None,
            },
            &mut out,
        );
        assert!(router.shape.is_none());
        assert!(out.is_empty());
    }
}
