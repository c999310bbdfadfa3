//! Session orchestration: one transcript, one user turn at a time.
//!
//! A user turn runs a thinking pass bounded by the thinking budget. If that
//! pass hits its limit, the assistant text so far (closed with the early-stop
//! directive when reasoning never finished) becomes a provisional turn and a
//! continuation pass bounded by the answer budget extends it. Exactly one
//! assistant turn is committed per user turn; any failure restores the
//! transcript to its pre-turn state.

pub mod events;
pub mod turn;

pub use events::{SessionEvent, SessionEventSink};
pub use turn::{AssistantTurnBuilder, TurnOutcome};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Result, ThinkcapError};
use crate::protocol::{BudgetDecision, ChannelDelta, PassKind, StreamConsumer};
use crate::provider::{GenerationEndpoint, OpenAiCompatibleEndpoint};
use crate::types::{GenerationRequest, StreamResult, Transcript, Turn};
use crate::util::timeout::maybe_timeout;

/// A single conversation against one generation endpoint.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    endpoint: Arc<dyn GenerationEndpoint>,
    transcript: Transcript,
    event_sink: Option<SessionEventSink>,
}

impl Session {
    pub fn new(config: SessionConfig, endpoint: Arc<dyn GenerationEndpoint>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            endpoint,
            transcript: Transcript::new(),
            event_sink: None,
        })
    }

    /// Session talking to the OpenAI-compatible endpoint named in `config`.
    pub fn from_config(config: SessionConfig) -> Result<Self> {
        let endpoint = OpenAiCompatibleEndpoint::new(
            config.model.clone(),
            config.api_key.clone(),
            config.endpoint.clone(),
        );
        Self::new(config, Arc::new(endpoint))
    }

    pub fn with_event_sink(mut self, sink: SessionEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Forget the conversation so far.
    pub fn reset(&mut self) {
        debug!(session_id = %self.id, turns = self.transcript.len(), "resetting transcript");
        self.transcript.clear();
    }

    /// Process one user turn and return the committed assistant text.
    pub async fn submit_turn(&mut self, user_text: &str) -> Result<TurnOutcome> {
        self.submit_turn_with_cancel(user_text, CancellationToken::new())
            .await
    }

    /// Like [`Session::submit_turn`], abandoning the turn when `cancel` fires.
    pub async fn submit_turn_with_cancel(
        &mut self,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(ThinkcapError::InvalidArgument("empty user turn".into()));
        }

        let checkpoint = self.transcript.len();
        self.transcript.push(Turn::user(user_text));

        match self.run_turn(&cancel).await {
            Ok((turn, outcome)) => {
                self.transcript.push(turn);
                info!(
                    session_id = %self.id,
                    passes = outcome.passes,
                    early_stopped = outcome.early_stopped,
                    answer_truncated = outcome.answer_truncated,
                    "turn committed"
                );
                self.emit(SessionEvent::TurnCommitted {
                    outcome: outcome.clone(),
                });
                Ok(outcome)
            }
            Err(e) => {
                self.transcript.truncate(checkpoint);
                warn!(session_id = %self.id, error = %e, "turn failed, transcript restored");
                self.emit(SessionEvent::TurnFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_turn(&self, cancel: &CancellationToken) -> Result<(Turn, TurnOutcome)> {
        if self.config.reasoning_disabled() {
            return self.run_direct(cancel).await;
        }

        let first = self
            .run_pass(PassKind::Thinking, self.config.thinking_budget, None, cancel)
            .await?;
        let decision = BudgetDecision::evaluate(&first);

        let mut builder = AssistantTurnBuilder::new(first.combined_text());
        if decision.needs_early_stop {
            let directive = builder.inject_early_stop();
            debug!(session_id = %self.id, "reasoning truncated, injected early stop");
            self.emit(SessionEvent::EarlyStopInjected {
                directive: directive.to_string(),
            });
        }

        let seed = builder.answer_so_far();
        if !seed.is_empty() {
            self.emit(SessionEvent::AnswerDelta {
                text: seed.to_string(),
            });
        }

        let mut outcome = TurnOutcome {
            passes: 1,
            early_stopped: builder.early_stopped(),
            termination_unknown: first.termination.is_none(),
            ..Default::default()
        };
        if outcome.termination_unknown {
            warn!(session_id = %self.id, "thinking pass ended without terminal status, committing as is");
        }

        if decision.needs_continuation {
            let second = self
                .run_pass(
                    PassKind::Continuation,
                    self.config.answer_budget,
                    Some(builder.provisional()),
                    cancel,
                )
                .await?;
            builder.append(&second.answer);
            outcome.passes = 2;
            outcome.answer_truncated = second.hit_length_limit();
            outcome.termination_unknown |= second.termination.is_none();
            if outcome.answer_truncated {
                warn!(session_id = %self.id, "continuation hit answer budget, answer is truncated");
            }
        }

        let turn = builder.commit();
        outcome.text = turn.content.clone();
        Ok((turn, outcome))
    }

    async fn run_direct(&self, cancel: &CancellationToken) -> Result<(Turn, TurnOutcome)> {
        let result = self
            .run_pass(PassKind::Direct, self.config.answer_budget, None, cancel)
            .await?;
        let outcome = TurnOutcome {
            text: result.answer.clone(),
            passes: 1,
            early_stopped: false,
            answer_truncated: result.hit_length_limit(),
            termination_unknown: result.termination.is_none(),
        };
        Ok((Turn::assistant(result.answer), outcome))
    }

    async fn run_pass(
        &self,
        pass: PassKind,
        token_limit: u32,
        provisional: Option<Turn>,
        cancel: &CancellationToken,
    ) -> Result<StreamResult> {
        let reasoning_enabled = !matches!(pass, PassKind::Direct);
        let request = GenerationRequest::new(
            self.transcript.snapshot_with(provisional),
            token_limit,
            reasoning_enabled,
        );

        self.emit(SessionEvent::PassStarted { pass, token_limit });

        let sink = self.event_sink.clone();
        let mut on_delta = move |delta: ChannelDelta| {
            if let Some(sink) = &sink {
                sink(match delta {
                    ChannelDelta::Reasoning(text) => SessionEvent::ReasoningDelta { text },
                    ChannelDelta::Answer(text) => SessionEvent::AnswerDelta { text },
                });
            }
        };

        let consumer = StreamConsumer::new(self.endpoint.as_ref());
        let result = maybe_timeout(
            self.config.request_timeout,
            consumer.run(&request, pass, cancel, &mut on_delta),
        )
        .await?;

        debug!(
            session_id = %self.id,
            %pass,
            termination = ?result.termination,
            reasoning_len = result.reasoning.len(),
            answer_len = result.answer.len(),
            "pass finished"
        );
        self.emit(SessionEvent::PassFinished {
            pass,
            termination: result.termination,
        });
        Ok(result)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sink) = &self.event_sink {
            sink(event);
        }
    }
}
