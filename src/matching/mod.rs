// src/matching/mod.rs
//! Job matching: hosted model, local model and keyword fallback behind one engine.

pub mod engine;
pub mod error;
pub mod hosted;
pub mod json_block;
pub mod keyword;
pub mod leaf;
pub mod local;
pub mod prompts;
pub mod types;
pub mod verdict;

pub use engine::{FallbackPolicy, MatchEngine};
pub use error::{ErrorKind, MatchError};
pub use hosted::{
    CompletionClient, CompletionRequest, DisabledCompletionClient, DynCompletionClient,
    OpenAiCompletionClient,
};
pub use keyword::{match_by_keywords, KeywordBreakdown, KeywordTable, SkillCategory};
pub use leaf::SUMMARY_PLACEHOLDER;
pub use local::{
    DynLocalModelClient, HealthGate, HttpLocalModelClient, LocalMatcher, LocalModelClient,
};
pub use types::{MatchRequest, MatchRequestBody, MatchResult, SkillsInput, Strategy};

/// Short SHA-256 prefix used to correlate log lines without logging candidate text.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
