// src/config/matcher.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::warn;

use crate::matching::FallbackPolicy;

pub const DEFAULT_MATCHER_CONFIG_PATH: &str = "config/matcher.json";
pub const ENV_MATCHER_CONFIG_PATH: &str = "MATCHER_CONFIG_PATH";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_LOCAL_MODEL_API_KEY: &str = "LOCAL_MODEL_API_KEY";
pub const ENV_LOCAL_MODEL_URL: &str = "LOCAL_MODEL_URL";
pub const ENV_FALLBACK_POLICY: &str = "MATCH_FALLBACK_POLICY";

const MAX_HEALTH_TIMEOUT_SECS: u64 = 30;

fn default_hosted_timeout() -> u64 {
    30
}
fn default_health_timeout() -> u64 {
    5
}
fn default_local_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    pub enabled: bool,
    /// Only "openai" (any OpenAI-compatible chat-completions endpoint).
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    /// "ENV" means: read from OPENAI_API_KEY
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key: "ENV".into(),
            timeout_secs: default_hosted_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Optional bearer token; "ENV" means: read from LOCAL_MODEL_API_KEY
    pub api_key: String,
    pub health_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// 0 = probe before every use.
    pub health_cache_secs: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:8000".into(),
            api_key: String::new(),
            health_timeout_secs: default_health_timeout(),
            request_timeout_secs: default_local_timeout(),
            health_cache_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub hosted: HostedConfig,
    pub local: LocalConfig,
    pub fallback: FallbackPolicy,
    /// Optional TOML keyword table replacing the built-in one.
    pub keywords_path: Option<PathBuf>,
}

impl MatcherConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read matcher config at {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        let cfg: MatcherConfig = serde_json::from_str(&data)?;
        cfg.resolve()
    }

    /// MATCHER_CONFIG_PATH, else `config/matcher.json`; a missing default file means defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_MATCHER_CONFIG_PATH) {
            return Self::load_from_file(p);
        }
        let path = PathBuf::from(DEFAULT_MATCHER_CONFIG_PATH);
        if path.exists() {
            Self::load_from_file(path)
        } else {
            MatcherConfig::default().resolve()
        }
    }

    /// Resolve "ENV" keys, apply env overrides and sanitize numbers.
    pub fn resolve(mut self) -> anyhow::Result<Self> {
        self.hosted.provider = self.hosted.provider.trim().to_lowercase();
        if self.hosted.provider != "openai" {
            anyhow::bail!("Unsupported hosted provider in config: {}", self.hosted.provider);
        }

        self.hosted.api_key = resolve_key(&self.hosted.api_key, ENV_OPENAI_API_KEY);
        self.local.api_key = resolve_key(&self.local.api_key, ENV_LOCAL_MODEL_API_KEY);

        if let Ok(url) = env::var(ENV_LOCAL_MODEL_URL) {
            if !url.trim().is_empty() {
                self.local.base_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = env::var(ENV_FALLBACK_POLICY) {
            match FallbackPolicy::parse(&raw) {
                Some(p) => self.fallback = p,
                None => warn!("Ignoring unknown {ENV_FALLBACK_POLICY}={raw}"),
            }
        }

        // Sanitize timeouts
        if self.hosted.timeout_secs == 0 {
            self.hosted.timeout_secs = default_hosted_timeout();
        }
        if self.local.health_timeout_secs == 0 {
            self.local.health_timeout_secs = default_health_timeout();
        }
        self.local.health_timeout_secs = self.local.health_timeout_secs.min(MAX_HEALTH_TIMEOUT_SECS);
        if self.local.request_timeout_secs == 0 {
            self.local.request_timeout_secs = default_local_timeout();
        }

        Ok(self)
    }
}

/// "ENV" (any case) → value of `var`, or empty if unset. Anything else is taken literally.
fn resolve_key(raw: &str, var: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("env") {
        env::var(var).map(|v| v.trim().to_string()).unwrap_or_else(|_| {
            warn!("{var} is not set; the corresponding model stays unconfigured");
            String::new()
        })
    } else {
        raw.trim().to_string()
    }
}
