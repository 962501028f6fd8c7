// src/matching/local.rs
//! Secondary matcher: self-hosted model behind `GET /health` + `POST /chat`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::MatchError;
use super::json_block::first_json_object;
use super::prompts;
use super::types::{MatchRequest, MatchResult, Strategy};
use super::verdict::parse_verdict;
use crate::config::LocalConfig;

#[async_trait::async_trait]
pub trait LocalModelClient: Send + Sync {
    /// Ok when the service answers its health endpoint with 2xx.
    async fn health(&self) -> Result<(), MatchError>;
    /// Free-text reply for a single prompt.
    async fn chat(&self, prompt: &str) -> Result<String, MatchError>;
}

pub type DynLocalModelClient = Arc<dyn LocalModelClient>;

/// Secondary matcher: one chat call, JSON block extracted from the reply.
pub async fn match_with_local(
    client: &dyn LocalModelClient,
    req: &MatchRequest,
) -> Result<MatchResult, MatchError> {
    let reply = client.chat(&prompts::local_match_prompt(req)).await?;
    let block = first_json_object(&reply)
        .ok_or_else(|| MatchError::malformed("no JSON object in local model reply"))?;
    parse_verdict(block, Strategy::LocalModel)
}

/* ----------------------------
Availability gate
---------------------------- */

/// Availability probe with an optional cached verdict.
///
/// With `cache_ttl == 0` every call probes. Otherwise the last probe result is reused
/// until it is older than the TTL (open/closed state with a timestamp).
#[derive(Debug)]
pub struct HealthGate {
    probe_timeout: Duration,
    cache_ttl: Duration,
    last: Mutex<Option<(bool, Instant)>>,
}

impl HealthGate {
    pub fn new(probe_timeout: Duration, cache_ttl: Duration) -> Self {
        Self {
            probe_timeout,
            cache_ttl,
            last: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<bool> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let guard = self.last.lock().ok()?;
        (*guard)
            .filter(|(_, at)| at.elapsed() < self.cache_ttl)
            .map(|(ok, _)| ok)
    }

    fn store(&self, ok: bool) {
        if self.cache_ttl.is_zero() {
            return;
        }
        if let Ok(mut guard) = self.last.lock() {
            *guard = Some((ok, Instant::now()));
        }
    }

    /// Probe (or reuse a fresh cached verdict). A hung service counts as unavailable.
    pub async fn is_available(&self, client: &dyn LocalModelClient) -> bool {
        if let Some(ok) = self.cached() {
            debug!(target: "matching", available = ok, "local model health (cached)");
            return ok;
        }

        let ok = match tokio::time::timeout(self.probe_timeout, client.health()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(target: "matching", error = %e, "local model health check failed");
                false
            }
            Err(_) => {
                warn!(
                    target: "matching",
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "local model health check timed out"
                );
                false
            }
        };
        counter!(
            "local_model_health_checks_total",
            "outcome" => if ok { "up" } else { "down" }
        )
        .increment(1);
        self.store(ok);
        ok
    }
}

/// Local client + its availability gate, as held by the engine.
pub struct LocalMatcher {
    client: DynLocalModelClient,
    gate: HealthGate,
}

impl LocalMatcher {
    pub fn new(client: DynLocalModelClient, gate: HealthGate) -> Self {
        Self { client, gate }
    }

    pub async fn is_available(&self) -> bool {
        self.gate.is_available(self.client.as_ref()).await
    }

    pub async fn try_match(&self, req: &MatchRequest) -> Result<MatchResult, MatchError> {
        match_with_local(self.client.as_ref(), req).await
    }
}

/* ----------------------------
HTTP client
---------------------------- */

pub struct HttpLocalModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

impl HttpLocalModelClient {
    pub fn new(cfg: &LocalConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mining-job-matcher/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.health_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("building local model HTTP client")?;
        let api_key = Some(cfg.api_key.trim().to_string()).filter(|k| !k.is_empty());
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn authorized(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => rb.bearer_auth(key),
            None => rb,
        }
    }
}

#[async_trait::async_trait]
impl LocalModelClient for HttpLocalModelClient {
    async fn health(&self) -> Result<(), MatchError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.authorized(self.http.get(&url)).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(MatchError::Unavailable(format!(
                "health endpoint returned {}",
                resp.status()
            )))
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String, MatchError> {
        let url = format!("{}/chat", self.base_url);
        let resp = self
            .authorized(self.http.post(&url))
            .json(&ChatBody { prompt })
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(MatchError::Api {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }
        let reply: ChatReply = serde_json::from_str(&text)?;
        Ok(reply.response)
    }
}
