// src/matching/leaf.rs
//! Single-shot hosted calls with no fallback chain: job summary and skill extraction.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use super::error::MatchError;
use super::hosted::{CompletionClient, CompletionRequest};
use super::prompts;

pub const SUMMARY_PLACEHOLDER: &str = "Summary not available";

/// 2-3 sentence summary, or `SUMMARY_PLACEHOLDER` on any failure.
pub async fn generate_job_summary(client: &dyn CompletionClient, description: &str) -> String {
    let prompt = prompts::job_summary_prompt(description);
    match client.complete(CompletionRequest::text(&prompt)).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(target: "matching", "job summary came back empty");
            SUMMARY_PLACEHOLDER.to_string()
        }
        Err(e) => {
            warn!(target: "matching", kind = e.kind().as_str(), error = %e, "job summary failed");
            SUMMARY_PLACEHOLDER.to_string()
        }
    }
}

/// Skill list parsed from a JSON array reply; empty on any failure.
pub async fn extract_job_skills(client: &dyn CompletionClient, description: &str) -> Vec<String> {
    let prompt = prompts::job_skills_prompt(description);
    let request = CompletionRequest {
        temperature: 0.2,
        ..CompletionRequest::text(&prompt)
    };
    let parsed = client
        .complete(request)
        .await
        .and_then(|text| parse_skill_array(&text));
    parsed.unwrap_or_else(|e| {
        warn!(target: "matching", kind = e.kind().as_str(), error = %e, "skill extraction failed");
        Vec::new()
    })
}

/// Strict: the reply must be a JSON array. String items are trimmed and de-duplicated.
pub fn parse_skill_array(text: &str) -> Result<Vec<String>, MatchError> {
    let value: Value = serde_json::from_str(text.trim())?;
    let items = value
        .as_array()
        .ok_or_else(|| MatchError::malformed("skills reply is not a JSON array"))?;

    let mut seen = HashSet::new();
    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect())
}
