// src/matching/verdict.rs
//! Strict parsing of the JSON verdict returned by either model.

use serde_json::{Map, Value};

use super::error::MatchError;
use super::types::{MatchResult, Strategy};

/// Parse a JSON object verdict into a `MatchResult` tagged with `strategy`.
///
/// * the text must be a JSON object (no prose, no arrays)
/// * `score` must be numeric; it is rounded and clamped to 0..=100
/// * missing list fields become empty lists; non-string items are skipped
pub fn parse_verdict(text: &str, strategy: Strategy) -> Result<MatchResult, MatchError> {
    let value: Value = serde_json::from_str(text.trim())?;
    let obj = value
        .as_object()
        .ok_or_else(|| MatchError::malformed("verdict is not a JSON object"))?;

    let score = obj
        .get("score")
        .and_then(number_as_i64)
        .ok_or_else(|| MatchError::malformed("verdict has no numeric `score`"))?;

    Ok(MatchResult::finish(
        score,
        string_list(obj, &["reasons"]),
        string_list(obj, &["recommendations"]),
        string_list(obj, &["missingSkills", "missing_skills"]),
        strategy,
    ))
}

fn number_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        // some models quote the number
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
