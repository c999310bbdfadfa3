//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Result, ThinkcapError};

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// Only the connect phase is bounded here; a whole pass is bounded by
/// `util::timeout` when configured.
pub fn shared_client() -> Result<&'static reqwest::Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(30))
        .pool_max_idle_per_host(4)
        .build()?;
    Ok(SHARED_CLIENT.get_or_init(|| client))
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for "[DONE]" and non-data lines.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ThinkcapError {
    match status {
        401 | 403 => ThinkcapError::Authentication(body.to_string()),
        429 => ThinkcapError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ThinkcapError::api(status, extract_message(body).unwrap_or_else(|| body.to_string())),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

fn extract_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let error = value.get("error").unwrap_or(&value);
    error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
