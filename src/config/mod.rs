//! Configuration (layered: defaults < config file < env < explicit overrides).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::{Result, ThinkcapError};

pub const DEFAULT_ENDPOINT: &str = "http://172.17.0.1:8000/v1";
pub const DEFAULT_MODEL: &str = "cpatonn/Qwen3-VL-32B-Thinking-AWQ-4bit";
pub const DEFAULT_THINKING_BUDGET: u32 = 8192;
pub const DEFAULT_ANSWER_BUDGET: u32 = 2048;
/// vLLM accepts any key; the OpenAI wire format still wants one.
pub const DEFAULT_API_KEY: &str = "EMPTY";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Session configuration handed to the orchestrator at construction.
///
/// A `thinking_budget` of zero disables reasoning entirely.
#[derive(Clone, PartialEq, Builder)]
pub struct SessionConfig {
    #[builder(into, default = DEFAULT_ENDPOINT.to_string())]
    pub endpoint: String,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    #[builder(default = DEFAULT_THINKING_BUDGET)]
    pub thinking_budget: u32,
    #[builder(default = DEFAULT_ANSWER_BUDGET)]
    pub answer_budget: u32,
    #[builder(into, default = DEFAULT_API_KEY.to_string())]
    pub api_key: String,
    /// Upper bound on a single pass, stream included.
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("thinking_budget", &self.thinking_budget)
            .field("answer_budget", &self.answer_budget)
            .field("api_key", &"..")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// On-disk shape of `~/.thinkcap/config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoint: Option<String>,
    model: Option<String>,
    thinking_budget: Option<u32>,
    answer_budget: Option<u32>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl SessionConfig {
    /// Defaults, then the user config file, then `.env` and the process
    /// environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        if let Some(path) = default_config_path() {
            config.merge_file(&path)?;
        }
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a TOML file. Returns `false` when the file does
    /// not exist.
    pub fn merge_file(&mut self, path: &Path) -> Result<bool> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(ThinkcapError::Io(err)),
        };
        let file: FileConfig = toml::from_str(&raw)?;

        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(budget) = file.thinking_budget {
            self.thinking_budget = budget;
        }
        if let Some(budget) = file.answer_budget {
            self.answer_budget = budget;
        }
        if let Some(key) = file.api_key {
            self.api_key = key;
        }
        if let Some(secs) = file.timeout_secs {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(true)
    }

    /// Overlay `THINKCAP_*` variables read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("THINKCAP_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = lookup("THINKCAP_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("THINKCAP_THINKING_BUDGET") {
            self.thinking_budget = parse_env("THINKCAP_THINKING_BUDGET", &raw)?;
        }
        if let Some(raw) = lookup("THINKCAP_ANSWER_BUDGET") {
            self.answer_budget = parse_env("THINKCAP_ANSWER_BUDGET", &raw)?;
        }
        if let Some(key) = lookup("THINKCAP_API_KEY") {
            self.api_key = key;
        }
        if let Some(raw) = lookup("THINKCAP_TIMEOUT_SECS") {
            let secs: u64 = parse_env("THINKCAP_TIMEOUT_SECS", &raw)?;
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ThinkcapError::Configuration("endpoint must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ThinkcapError::Configuration("model must not be empty".into()));
        }
        if self.answer_budget == 0 {
            return Err(ThinkcapError::Configuration(
                "answer budget must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Zero thinking budget: single answer pass with reasoning disabled.
    pub fn reasoning_disabled(&self) -> bool {
        self.thinking_budget == 0
    }
}

/// `~/.thinkcap/config.toml`, when a home directory can be found.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".thinkcap").join(CONFIG_FILE_NAME))
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ThinkcapError::Configuration(format!("{name} has invalid value '{raw}'")))
}
