//! Shared test helpers and a scripted endpoint.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;

use thinkcap::error::{Result, ThinkcapError};
use thinkcap::provider::GenerationEndpoint;
use thinkcap::session::{SessionEvent, SessionEventSink};
use thinkcap::types::*;

/// One scripted pass: either a chunk list or a failure to open.
pub enum ScriptedPass {
    Chunks(Vec<Result<StreamChunk>>),
    Fail(ThinkcapError),
    /// Yields the chunks, then never ends.
    Hang(Vec<StreamChunk>),
}

/// An endpoint that replays queued passes and records every request.
pub struct MockEndpoint {
    passes: Mutex<Vec<ScriptedPass>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            passes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a pass that streams the given chunks.
    pub fn queue(&self, chunks: Vec<StreamChunk>) {
        self.passes
            .lock()
            .unwrap()
            .push(ScriptedPass::Chunks(chunks.into_iter().map(Ok).collect()));
    }

    /// Queue a pass whose stream items may include errors.
    pub fn queue_results(&self, items: Vec<Result<StreamChunk>>) {
        self.passes.lock().unwrap().push(ScriptedPass::Chunks(items));
    }

    /// Queue a pass that fails before streaming.
    pub fn queue_failure(&self, error: ThinkcapError) {
        self.passes.lock().unwrap().push(ScriptedPass::Fail(error));
    }

    /// Queue a pass that stalls after the given chunks.
    pub fn queue_hang(&self, chunks: Vec<StreamChunk>) {
        self.passes.lock().unwrap().push(ScriptedPass::Hang(chunks));
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationEndpoint for MockEndpoint {
    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn open_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        self.requests.lock().unwrap().push(request.clone());
        let pass = {
            let mut passes = self.passes.lock().unwrap();
            if passes.is_empty() {
                return Err(ThinkcapError::Stream("no scripted pass queued".into()));
            }
            passes.remove(0)
        };

        match pass {
            ScriptedPass::Chunks(items) => Ok(Box::pin(futures::stream::iter(items))),
            ScriptedPass::Fail(error) => Err(error),
            ScriptedPass::Hang(chunks) => {
                let stream = async_stream::stream! {
                    for chunk in chunks {
                        yield Ok(chunk);
                    }
                    futures::future::pending::<()>().await;
                };
                Ok(Box::pin(stream))
            }
        }
    }
}

/// Event sink that records everything it sees.
pub fn recording_sink() -> (SessionEventSink, Arc<Mutex<Vec<SessionEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: SessionEventSink = Arc::new(move |event: SessionEvent| captured.lock().unwrap().push(event));
    (sink, events)
}

/// Concatenated text of all reasoning-channel events.
pub fn reasoning_text(events: &[SessionEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::ReasoningDelta { text } => Some(text.as_str()),
            SessionEvent::EarlyStopInjected { directive } => Some(directive.as_str()),
            _ => None,
        })
        .collect()
}

/// Concatenated text of all answer-channel events.
pub fn answer_text(events: &[SessionEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::AnswerDelta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
