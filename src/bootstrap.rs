// src/bootstrap.rs
//! Wire config → clients → `MatchEngine`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::matching::{
    DisabledCompletionClient, DynCompletionClient, DynLocalModelClient, HealthGate,
    HttpLocalModelClient, KeywordTable, LocalMatcher, MatchEngine, OpenAiCompletionClient,
};

pub struct MatcherRuntime {
    pub cfg: MatcherConfig,
    pub engine: Arc<MatchEngine>,
}

impl MatcherRuntime {
    /// Load config via `MATCHER_CONFIG_PATH` / `config/matcher.json` and build the engine.
    pub fn from_default_config() -> anyhow::Result<Self> {
        Self::from_config(MatcherConfig::load_default()?)
    }

    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        Self::from_config(MatcherConfig::load_from_file(path)?)
    }

    pub fn from_config(cfg: MatcherConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: only flags + key length
        info!(
            "matcher cfg loaded: hosted={} (enabled={}, key_len={}), local={} (enabled={}), fallback={:?}",
            cfg.hosted.model,
            cfg.hosted.enabled,
            cfg.hosted.api_key.len(),
            cfg.local.base_url,
            cfg.local.enabled,
            cfg.fallback
        );
        let engine = build_engine(&cfg)?;
        Ok(Self {
            cfg,
            engine: Arc::new(engine),
        })
    }
}

pub fn build_engine(cfg: &MatcherConfig) -> anyhow::Result<MatchEngine> {
    let hosted: DynCompletionClient = if cfg.hosted.enabled {
        Arc::new(OpenAiCompletionClient::new(&cfg.hosted)?)
    } else {
        warn!("hosted model disabled in config; matches start at the fallback chain");
        Arc::new(DisabledCompletionClient)
    };

    let mut engine = MatchEngine::new(hosted).with_policy(cfg.fallback);

    if cfg.local.enabled {
        let client: DynLocalModelClient = Arc::new(HttpLocalModelClient::new(&cfg.local)?);
        let gate = HealthGate::new(
            Duration::from_secs(cfg.local.health_timeout_secs),
            Duration::from_secs(cfg.local.health_cache_secs),
        );
        engine = engine.with_local(LocalMatcher::new(client, gate));
    }

    if let Some(path) = &cfg.keywords_path {
        engine = engine.with_keywords(KeywordTable::from_path(path)?);
    }

    Ok(engine)
}
