// src/matching/engine.rs
//! # Match Engine
//! Sequential dispatch over the three matchers:
//! hosted model → (health-gated) local model → keyword fallback.
//!
//! Routing is driven by explicit `ErrorKind` checks; nothing escapes to the caller.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::anon_hash;
use super::error::{ErrorKind, MatchError};
use super::hosted::{match_with_hosted, DynCompletionClient};
use super::keyword::{match_by_keywords, KeywordTable};
use super::leaf;
use super::local::LocalMatcher;
use super::types::{MatchRequest, MatchResult, Strategy};

/// Which hosted-model failures continue down the fallback chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Only quota/rate-limit (and "not configured") failures fall through;
    /// any other hosted failure yields the zero-score `unavailable` result.
    #[default]
    QuotaOnly,
    /// Every hosted failure falls through to the local model / keywords.
    AnyError,
}

impl FallbackPolicy {
    pub fn falls_through(self, kind: ErrorKind) -> bool {
        match self {
            FallbackPolicy::AnyError => true,
            FallbackPolicy::QuotaOnly => {
                matches!(kind, ErrorKind::Quota | ErrorKind::NotConfigured)
            }
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quota_only" | "quota" => Some(FallbackPolicy::QuotaOnly),
            "any_error" | "any" | "all" => Some(FallbackPolicy::AnyError),
            _ => None,
        }
    }
}

pub struct MatchEngine {
    hosted: DynCompletionClient,
    local: Option<LocalMatcher>,
    keywords: Arc<KeywordTable>,
    policy: FallbackPolicy,
}

impl MatchEngine {
    /// Engine with the built-in keyword table, no local model and the default policy.
    pub fn new(hosted: DynCompletionClient) -> Self {
        Self {
            hosted,
            local: None,
            keywords: Arc::new(KeywordTable::builtin().clone()),
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_local(mut self, local: LocalMatcher) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_keywords(mut self, table: KeywordTable) -> Self {
        self.keywords = Arc::new(table);
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn hosted_provider(&self) -> &'static str {
        self.hosted.provider_name()
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Always returns a result; failures are logged and routed, never returned.
    pub async fn match_candidate_to_job(&self, req: &MatchRequest) -> MatchResult {
        let started = Instant::now();
        let id = anon_hash(&req.candidate_skills);

        let result = self.run_chain(req, &id).await;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!("job_match_results_total", "strategy" => result.strategy.as_str()).increment(1);
        histogram!("job_match_duration_ms").record(elapsed_ms);
        info!(
            target: "matching",
            %id,
            strategy = result.strategy.as_str(),
            score = result.score,
            elapsed_ms = elapsed_ms as u64,
            "match complete"
        );
        result
    }

    async fn run_chain(&self, req: &MatchRequest, id: &str) -> MatchResult {
        // 1) hosted model
        match match_with_hosted(self.hosted.as_ref(), req).await {
            Ok(result) => return result,
            Err(e) => {
                if !self.policy.falls_through(e.kind()) {
                    log_failure(id, Strategy::HostedModel, &e, "returning degraded result");
                    return MatchResult::unavailable();
                }
                log_failure(id, Strategy::HostedModel, &e, "falling back");
                counter!("job_match_fallbacks_total", "from" => Strategy::HostedModel.as_str())
                    .increment(1);
            }
        }

        // 2-3) local model, only if its health probe passes
        if let Some(local) = &self.local {
            if local.is_available().await {
                match local.try_match(req).await {
                    Ok(result) => return result,
                    Err(e) => {
                        log_failure(id, Strategy::LocalModel, &e, "falling back to keywords");
                        counter!("job_match_fallbacks_total", "from" => Strategy::LocalModel.as_str())
                            .increment(1);
                    }
                }
            } else {
                debug!(target: "matching", %id, "local model unavailable; skipping");
            }
        }

        // 4) keywords (cannot fail)
        match_by_keywords(&self.keywords, req)
    }

    /// Hosted-only summary; placeholder text on failure.
    pub async fn generate_job_summary(&self, description: &str) -> String {
        leaf::generate_job_summary(self.hosted.as_ref(), description).await
    }

    /// Hosted-only skill extraction; empty list on failure.
    pub async fn extract_job_skills(&self, description: &str) -> Vec<String> {
        leaf::extract_job_skills(self.hosted.as_ref(), description).await
    }
}

fn log_failure(id: &str, strategy: Strategy, err: &MatchError, next: &str) {
    warn!(
        target: "matching",
        %id,
        strategy = strategy.as_str(),
        kind = err.kind().as_str(),
        error = %err,
        "matcher failed; {next}"
    );
}
