//! CLI entry point for thinkcap.

pub mod console;

use std::time::Duration;

use clap::Parser;

use crate::config::SessionConfig;

/// Chat with a reasoning model under a thinking budget.
///
/// Flags override `~/.thinkcap/config.toml` and `THINKCAP_*` variables.
#[derive(Parser, Debug)]
#[command(name = "thinkcap", version, about = "Chat with a reasoning model under a thinking budget")]
pub struct Cli {
    /// OpenAI-compatible server base URL
    #[arg(long)]
    pub host: Option<String>,

    /// Model name served by the endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Thinking budget in tokens (0 to disable thinking)
    #[arg(long)]
    pub thinking_budget: Option<u32>,

    /// Max tokens for the final answer continuation
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// API key sent as a bearer token
    #[arg(long)]
    pub api_key: Option<String>,

    /// Per-pass timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overlay explicitly given flags onto `config`.
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(ref host) = self.host {
            config.endpoint = host.clone();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(budget) = self.thinking_budget {
            config.thinking_budget = budget;
        }
        if let Some(max) = self.max_tokens {
            config.answer_budget = max;
        }
        if let Some(ref key) = self.api_key {
            config.api_key = key.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
    }
}
