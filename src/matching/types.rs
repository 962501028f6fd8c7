// src/matching/types.rs
//! Request/result types shared by every matcher.

use serde::{Deserialize, Serialize};

/// Candidate skills as they arrive from callers: free text or a list of entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SkillsInput {
    Text(String),
    List(Vec<String>),
}

impl SkillsInput {
    /// Lists are joined with ", " so every matcher sees one block of text.
    pub fn into_text(self) -> String {
        match self {
            SkillsInput::Text(s) => s,
            SkillsInput::List(items) => items.join(", "),
        }
    }
}

impl Default for SkillsInput {
    fn default() -> Self {
        SkillsInput::Text(String::new())
    }
}

/// Input to the match engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRequest {
    pub candidate_skills: String,
    pub job_description: String,
    /// Kept in caller order for display; matching does not depend on it.
    pub job_requirements: Vec<String>,
}

impl MatchRequest {
    pub fn new(
        candidate_skills: impl Into<String>,
        job_description: impl Into<String>,
        job_requirements: Vec<String>,
    ) -> Self {
        Self {
            candidate_skills: candidate_skills.into(),
            job_description: job_description.into(),
            job_requirements,
        }
    }

    /// Requirements rendered as a bullet list for prompts.
    pub fn requirements_block(&self) -> String {
        if self.job_requirements.is_empty() {
            return "- (none listed)".to_string();
        }
        self.job_requirements
            .iter()
            .map(|r| format!("- {}", r.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Wire shape of a match request (`/api/match`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequestBody {
    #[serde(default)]
    pub candidate_skills: SkillsInput,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub job_requirements: Vec<String>,
}

impl From<MatchRequestBody> for MatchRequest {
    fn from(body: MatchRequestBody) -> Self {
        MatchRequest {
            candidate_skills: body.candidate_skills.into_text(),
            job_description: body.job_description,
            job_requirements: body.job_requirements,
        }
    }
}

/// Which matcher produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    HostedModel,
    LocalModel,
    Keyword,
    /// Hosted model failed in a way that does not route to the fallback chain.
    Unavailable,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::HostedModel,
        Strategy::LocalModel,
        Strategy::Keyword,
        Strategy::Unavailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::HostedModel => "hosted_model",
            Strategy::LocalModel => "local_model",
            Strategy::Keyword => "keyword",
            Strategy::Unavailable => "unavailable",
        }
    }

    /// The reserved trailing entry in `MatchResult::reasons`.
    pub fn provenance_reason(self) -> &'static str {
        match self {
            Strategy::HostedModel => "Analysis generated by the hosted AI model",
            Strategy::LocalModel => {
                "Analysis generated by the local AI model (hosted AI service unavailable)"
            }
            Strategy::Keyword => {
                "Analysis based on keyword matching (AI services unavailable)"
            }
            Strategy::Unavailable => {
                "AI match analysis is temporarily unavailable; please try again later"
            }
        }
    }

    pub fn is_provenance(reason: &str) -> bool {
        Strategy::ALL
            .iter()
            .any(|s| s.provenance_reason() == reason)
    }
}

/// Output of the match engine; same shape whichever matcher ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub score: u8,
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strategy: Strategy,
}

impl MatchResult {
    /// Assemble a result: clamps the score, drops empty/provenance-looking reasons
    /// and appends exactly one provenance entry for `strategy`.
    pub fn finish(
        score: i64,
        reasons: Vec<String>,
        recommendations: Vec<String>,
        missing_skills: Vec<String>,
        strategy: Strategy,
    ) -> Self {
        let mut reasons: Vec<String> = reasons
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty() && !Strategy::is_provenance(r))
            .collect();
        reasons.push(strategy.provenance_reason().to_string());
        Self {
            score: clamp_score(score),
            reasons,
            recommendations: clean_list(recommendations),
            missing_skills: clean_list(missing_skills),
            strategy,
        }
    }

    /// Zero-score result returned when the hosted model fails without routing to fallback.
    pub fn unavailable() -> Self {
        Self::finish(0, Vec::new(), Vec::new(), Vec::new(), Strategy::Unavailable)
    }

    pub fn provenance(&self) -> Option<&str> {
        self.reasons.last().map(String::as_str)
    }
}

pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
