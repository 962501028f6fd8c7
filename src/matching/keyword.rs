// src/matching/keyword.rs
//! Offline keyword matcher: weighted token overlap + category bonuses.
//!
//! Deterministic by construction: no clock, no randomness, and every output list is
//! built in table or input order (never in hash order). This is the last resort of the
//! fallback chain and cannot fail.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::types::{MatchRequest, MatchResult, Strategy};

const BUILTIN_TABLE_TOML: &str = include_str!("../../config/keywords.toml");

/// Max weight assumed per job token when normalizing.
const MAX_WEIGHT_PER_JOB_TOKEN: u32 = 5;

pub const STRONG_MATCH: u8 = 70;
pub const MODERATE_MATCH: u8 = 50;

static BUILTIN: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::from_toml_str(BUILTIN_TABLE_TOML).expect("built-in keyword table")
});

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex"));

/// Critical terms: present in the job but absent from the candidate → missing skill.
const CRITICAL_TERMS: &[(&str, &str)] = &[
    ("safety", "Mining safety certification or training"),
    ("certified", "Relevant professional certification"),
    ("licensed", "Required operating licence or ticket"),
    ("experience", "Relevant mining industry experience"),
];

/// High-signal term groups; each yields its own reason when any member matched.
struct Signal {
    terms: &'static [&'static str],
    reason: &'static str,
}

const SIGNALS: &[Signal] = &[
    Signal {
        terms: &[
            "safety", "samtrac", "mhsa", "sheq", "ohs", "certified", "certification",
            "certificate", "licensed", "licence", "license",
        ],
        reason: "Safety and certification credentials align with the role",
    },
    Signal {
        terms: &[
            "underground", "surface", "opencast", "openpit", "shaft", "stoping", "decline",
            "pit",
        ],
        reason: "Experience in the required mining environment",
    },
    Signal {
        terms: &[
            "equipment", "machinery", "drill", "drilling", "blasting", "excavator", "loader",
            "lhd", "dozer", "haul", "truck", "jumbo", "bolter", "crusher", "conveyor",
        ],
        reason: "Relevant equipment and machinery operation experience",
    },
    Signal {
        terms: &["experience", "experienced", "years", "senior"],
        reason: "Level of experience appears to meet the role's expectations",
    },
    Signal {
        terms: &[
            "operator", "engineer", "geologist", "supervisor", "foreman", "superintendent",
            "manager", "technician", "officer", "electrician", "fitter", "artisan",
            "metallurgist", "surveyor", "blaster",
        ],
        reason: "Previous role titles match this position",
    },
];

const RECOMMENDATIONS_STRONG: [&str; 3] = [
    "Highlight your matching certifications and site experience at the top of your CV",
    "Apply promptly - your profile aligns well with this role",
    "Prepare concrete examples of your mining experience for the interview",
];

const RECOMMENDATIONS_MODERATE: [&str; 3] = [
    "Emphasize transferable skills that relate to the listed requirements",
    "Consider short courses to close the remaining skill gaps",
    "Tailor your CV to use the same terminology as the job listing",
];

const RECOMMENDATIONS_WEAK: [&str; 3] = [
    "Review the job requirements carefully against your experience",
    "Pursue the certifications and safety training listed for this role",
    "Consider trainee or entry-level mining roles to build relevant experience",
];

/* ----------------------------
Table (config schema + compiled)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct KeywordTableFile {
    #[serde(default = "default_weight")]
    default_weight: u32,
    #[serde(default = "default_category_bonus")]
    category_bonus: u32,
    #[serde(default)]
    weights: HashMap<String, u32>,
    #[serde(default)]
    categories: Vec<SkillCategory>,
}

fn default_weight() -> u32 {
    3
}
fn default_category_bonus() -> u32 {
    10
}

/// Named group of related terms; matching 2+ of them earns the category bonus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordTable {
    default_weight: u32,
    category_bonus: u32,
    weights: HashMap<String, u32>,
    categories: Vec<SkillCategory>,
}

impl KeywordTable {
    /// Table shipped in `config/keywords.toml`, compiled into the binary.
    pub fn builtin() -> &'static KeywordTable {
        &BUILTIN
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let file: KeywordTableFile = toml::from_str(toml_str)?;

        let weights = file
            .weights
            .into_iter()
            .map(|(term, w)| (term.trim().to_lowercase(), w))
            .collect();

        let categories = file
            .categories
            .into_iter()
            .map(|c| {
                let mut seen = HashSet::new();
                let terms = c
                    .terms
                    .into_iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty() && seen.insert(t.clone()))
                    .collect();
                SkillCategory {
                    name: c.name,
                    terms,
                }
            })
            .collect();

        Ok(Self {
            default_weight: file.default_weight,
            category_bonus: file.category_bonus,
            weights,
            categories,
        })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading keyword table from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing keyword table {}", path.display()))
    }

    /// Weight of a matched token (falls back to the default weight).
    pub fn weight(&self, token: &str) -> u32 {
        self.weights
            .get(token)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn categories(&self) -> &[SkillCategory] {
        &self.categories
    }

    /// Full breakdown of how a request scores against this table.
    pub fn analyze(&self, req: &MatchRequest) -> KeywordBreakdown {
        let candidate_tokens = tokenize(&req.candidate_skills);
        let job_tokens = tokenize(&job_text(req));

        let job_set: HashSet<&str> = job_tokens.iter().map(String::as_str).collect();
        let candidate_set: HashSet<&str> = candidate_tokens.iter().map(String::as_str).collect();

        // distinct candidate tokens, first-occurrence order
        let mut matched: Vec<String> = Vec::new();
        let mut raw_score = 0u32;
        let mut seen = HashSet::new();
        for token in &candidate_tokens {
            if !seen.insert(token.as_str()) || !job_set.contains(token.as_str()) {
                continue;
            }
            raw_score = raw_score.saturating_add(self.weight(token));
            matched.push(token.clone());
        }

        let matched_set: HashSet<&str> = matched.iter().map(String::as_str).collect();
        let mut category_hits = Vec::new();
        for category in &self.categories {
            let hits = category
                .terms
                .iter()
                .filter(|t| matched_set.contains(t.as_str()))
                .count();
            if hits >= 2 {
                raw_score = raw_score.saturating_add(self.category_bonus);
                category_hits.push((category.name.clone(), hits));
            }
        }

        let missing_skills = CRITICAL_TERMS
            .iter()
            .filter(|(term, _)| job_set.contains(term) && !candidate_set.contains(term))
            .map(|(_, desc)| desc.to_string())
            .collect();

        let job_token_count = job_tokens.len();
        let score = normalize_score(raw_score, job_token_count);

        KeywordBreakdown {
            matched,
            category_hits,
            missing_skills,
            raw_score,
            job_token_count,
            score,
        }
    }
}

/// Intermediate numbers behind a keyword result (exposed for diagnostics/tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBreakdown {
    pub matched: Vec<String>,
    /// (category name, matched member count) for categories that earned the bonus.
    pub category_hits: Vec<(String, usize)>,
    pub missing_skills: Vec<String>,
    pub raw_score: u32,
    pub job_token_count: usize,
    pub score: u8,
}

impl KeywordBreakdown {
    fn reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .category_hits
            .iter()
            .map(|(name, n)| format!("Strong {name} alignment ({n} matching terms)"))
            .collect();

        let matched: HashSet<&str> = self.matched.iter().map(String::as_str).collect();
        for signal in SIGNALS {
            let hits: Vec<&str> = signal
                .terms
                .iter()
                .copied()
                .filter(|t| matched.contains(t))
                .collect();
            if !hits.is_empty() {
                reasons.push(format!("{} ({})", signal.reason, hits.join(", ")));
            }
        }

        reasons.push(tier_reason(self.score).to_string());
        reasons
    }
}

/// Keyword fallback matcher. Never fails.
pub fn match_by_keywords(table: &KeywordTable, req: &MatchRequest) -> MatchResult {
    let breakdown = table.analyze(req);
    let reasons = breakdown.reasons();
    let recommendations = recommendations_for(breakdown.score)
        .iter()
        .map(|s| s.to_string())
        .collect();
    MatchResult::finish(
        i64::from(breakdown.score),
        reasons,
        recommendations,
        breakdown.missing_skills,
        Strategy::Keyword,
    )
}

/* ----------------------------
Helpers
---------------------------- */

/// Lowercase, drop punctuation, split on whitespace, keep tokens longer than 2 chars.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn job_text(req: &MatchRequest) -> String {
    let mut text = req.job_description.clone();
    for r in &req.job_requirements {
        text.push(' ');
        text.push_str(r);
    }
    text
}

fn normalize_score(raw: u32, job_token_count: usize) -> u8 {
    if job_token_count == 0 {
        return 0;
    }
    let max = job_token_count as f64 * f64::from(MAX_WEIGHT_PER_JOB_TOKEN);
    let pct = (f64::from(raw) / max * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

fn tier_reason(score: u8) -> &'static str {
    if score >= STRONG_MATCH {
        "Strong match: your profile covers most of the key job requirements"
    } else if score >= MODERATE_MATCH {
        "Moderate match: your profile covers several of the job requirements"
    } else {
        "Weak match: limited overlap between your profile and the job requirements"
    }
}

fn recommendations_for(score: u8) -> &'static [&'static str; 3] {
    if score >= STRONG_MATCH {
        &RECOMMENDATIONS_STRONG
    } else if score >= MODERATE_MATCH {
        &RECOMMENDATIONS_MODERATE
    } else {
        &RECOMMENDATIONS_WEAK
    }
}
