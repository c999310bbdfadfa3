//! OpenAI-compatible chat completions endpoint (vLLM and friends).

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, ThinkcapError};
use crate::types::{GenerationRequest, StreamChunk, Termination, Turn};

use super::http::{bearer_headers, parse_sse_data, shared_client, status_to_error};
use super::GenerationEndpoint;

/// Streams `/chat/completions` from an OpenAI-compatible server.
///
/// Reasoning is toggled through `chat_template_kwargs.enable_thinking`, which
/// reasoning-template servers apply when rendering the prompt.
pub struct OpenAiCompatibleEndpoint {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatibleEndpoint {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let messages = request
            .transcript()
            .iter()
            .map(turn_to_openai)
            .collect::<Vec<_>>();

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
            "max_tokens": request.token_limit(),
            "chat_template_kwargs": {
                "enable_thinking": request.reasoning_enabled(),
            },
        })
    }
}

#[async_trait]
impl GenerationEndpoint for OpenAiCompatibleEndpoint {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn open_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, %url, "chat completions stream");

        let resp = shared_client()?
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut parsed_any = false;
            futures::pin_mut!(byte_stream);

            loop {
                let next = byte_stream.next().await;
                let at_end = next.is_none();
                match next {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        yield Err(ThinkcapError::Network(e));
                        break;
                    }
                    None => buffer.push(b'\n'),
                }

                let mut failed = false;
                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = parse_sse_data(line) else {
                        continue;
                    };
                    match parse_stream_payload(data) {
                        Ok(Some(chunk)) => {
                            parsed_any = true;
                            yield Ok(chunk);
                        }
                        Ok(None) => parsed_any = true,
                        Err(e) if !parsed_any || matches!(e, ThinkcapError::Stream(_)) => {
                            yield Err(e);
                            failed = true;
                            break;
                        }
                        Err(e) => warn!(error = %e, "skipping unparseable stream chunk"),
                    }
                }

                if failed || at_end {
                    break;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Parse one SSE `data:` payload.
///
/// `Ok(None)` for payloads without choices (usage-only chunks). An error
/// object from the server is a `Stream` error; malformed JSON is a
/// `Serialization` error.
pub fn parse_stream_payload(data: &str) -> Result<Option<StreamChunk>> {
    let value: serde_json::Value = serde_json::from_str(data)?;

    if let Some(message) = server_error_message(&value) {
        return Err(ThinkcapError::Stream(message));
    }

    let chunk: OpenAiStreamChunk = serde_json::from_value(value)?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    Ok(Some(StreamChunk {
        reasoning: choice.delta.reasoning_content.or(choice.delta.reasoning),
        content: choice.delta.content,
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(Termination::from_finish_reason),
    }))
}

fn server_error_message(value: &serde_json::Value) -> Option<String> {
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(message);
    }
    if value.get("object").and_then(|o| o.as_str()) == Some("error") {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown server error");
        return Some(message.to_string());
    }
    None
}

fn turn_to_openai(turn: &Turn) -> serde_json::Value {
    serde_json::json!({ "role": turn.role.to_string(), "content": turn.content })
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiStreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
}
