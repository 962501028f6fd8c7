// src/matching/prompts.rs
//! Prompt builders for the hosted and local models.

use super::types::MatchRequest;

pub const MATCH_SYSTEM: &str = "You are an expert mining industry recruiter. \
Assess candidates objectively and respond with JSON only.";

/// Prompt for the hosted model (JSON mode is enforced by the API request).
pub fn hosted_match_prompt(req: &MatchRequest) -> String {
    format!(
        "Analyze how well this candidate matches the mining job below.\n\n\
Candidate skills and experience:\n{skills}\n\n\
Job description:\n{description}\n\n\
Job requirements:\n{requirements}\n\n\
Respond with a JSON object with exactly these fields:\n\
{{\"score\": <integer 0-100>, \"reasons\": [<strings>], \"recommendations\": [<strings>], \"missingSkills\": [<strings>]}}\n\
Consider safety certifications, mining environment (underground/surface), equipment, \
technical skills and years of experience.",
        skills = req.candidate_skills.trim(),
        description = req.job_description.trim(),
        requirements = req.requirements_block(),
    )
}

/// Prompt for the local model; it has no JSON mode, so the format is spelled out.
pub fn local_match_prompt(req: &MatchRequest) -> String {
    format!(
        "{MATCH_SYSTEM}\n\n{}\n\nReturn ONLY the JSON object, no commentary.",
        hosted_match_prompt(req)
    )
}

pub fn job_summary_prompt(description: &str) -> String {
    format!(
        "Summarize this mining job posting in 2-3 sentences for a job seeker. \
Mention the role, the work environment and the key requirements. \
Return plain text only.\n\nJob description:\n{}",
        description.trim()
    )
}

pub fn job_skills_prompt(description: &str) -> String {
    format!(
        "Extract the 5-10 most important skills or qualifications from this mining job posting. \
Respond with a JSON array of short strings only, e.g. [\"SAMTRAC\", \"LHD operation\"].\n\n\
Job description:\n{}",
        description.trim()
    )
}
