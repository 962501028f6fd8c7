// src/matching/hosted.rs
//! Primary matcher: hosted chat-completion model (OpenAI-compatible API).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::MatchError;
use super::prompts;
use super::types::{MatchRequest, MatchResult, Strategy};
use super::verdict::parse_verdict;
use crate::config::HostedConfig;

/// Provider error codes that mean "out of budget", not "request refused".
const QUOTA_CODES: &[&str] = &[
    "insufficient_quota",
    "rate_limit_exceeded",
    "billing_hard_limit_reached",
];

/// One chat-completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    /// Ask the provider to enforce a JSON object reply.
    pub json_object: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl<'a> CompletionRequest<'a> {
    pub fn text(prompt: &'a str) -> Self {
        Self {
            system: None,
            prompt,
            json_object: false,
            temperature: 0.3,
            max_tokens: 400,
        }
    }

    pub fn json(prompt: &'a str) -> Self {
        Self {
            json_object: true,
            temperature: 0.2,
            max_tokens: 800,
            ..Self::text(prompt)
        }
    }
}

/// Seam for the hosted completion API (real HTTP client in prod, stubs in tests).
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, MatchError>;
    fn provider_name(&self) -> &'static str;
}

pub type DynCompletionClient = Arc<dyn CompletionClient>;

/// Primary matcher: one hosted call, strict JSON verdict.
pub async fn match_with_hosted(
    client: &dyn CompletionClient,
    req: &MatchRequest,
) -> Result<MatchResult, MatchError> {
    let prompt = prompts::hosted_match_prompt(req);
    let request = CompletionRequest {
        system: Some(prompts::MATCH_SYSTEM),
        ..CompletionRequest::json(&prompt)
    };
    let content = client.complete(request).await?;
    parse_verdict(&content, Strategy::HostedModel)
}

/* ----------------------------
OpenAI-compatible client
---------------------------- */

pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(cfg: &HostedConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mining-job-matcher/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building hosted model HTTP client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, MatchError> {
        if self.api_key.trim().is_empty() {
            return Err(MatchError::NotConfigured("hosted model API key"));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(Msg {
                role: "system",
                content: system,
            });
        }
        messages.push(Msg {
            role: "user",
            content: request.prompt,
        });

        let body = ChatReq {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(classify_api_failure(status.as_u16(), &text));
        }

        let parsed: ChatResp = serde_json::from_str(&text)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(MatchError::malformed("hosted model returned empty content"));
        }
        debug!(target: "matching", chars = content.len(), "hosted completion received");
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Map a non-2xx response to a quota error (429 / quota codes) or a plain API error.
pub fn classify_api_failure(status: u16, body: &str) -> MatchError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let quota_code = parsed.as_ref().is_some_and(|env| {
        [env.error.code.as_deref(), env.error.kind.as_deref()]
            .into_iter()
            .flatten()
            .any(|c| QUOTA_CODES.contains(&c))
    });
    let message = parsed
        .map(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| truncate(body, 200));

    if status == 429 || quota_code {
        MatchError::QuotaExhausted {
            status: Some(status),
            message,
        }
    } else {
        MatchError::Api { status, message }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Used when the hosted provider is switched off in config.
pub struct DisabledCompletionClient;

#[async_trait::async_trait]
impl CompletionClient for DisabledCompletionClient {
    async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, MatchError> {
        Err(MatchError::NotConfigured("hosted model"))
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
