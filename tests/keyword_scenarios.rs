// tests/keyword_scenarios.rs
//
// Keyword fallback matcher against the built-in table: reference scenarios,
// category bonus, missing-skill detection, and a seeded property sweep.

use mining_job_matcher::matching::{match_by_keywords, KeywordTable, MatchRequest, Strategy};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

fn supervisor_job(candidate: &str) -> MatchRequest {
    MatchRequest::new(
        candidate,
        "Seeking underground safety supervisor with SAMTRAC certification",
        vec![
            "SAMTRAC certified".into(),
            "5+ years underground experience".into(),
            "safety management".into(),
        ],
    )
}

fn provenance_count(reasons: &[String]) -> usize {
    reasons.iter().filter(|r| Strategy::is_provenance(r)).count()
}

#[test]
fn experienced_safety_officer_is_a_strong_match() {
    let req = supervisor_job(
        "5 years underground mining experience, SAMTRAC certified, safety officer",
    );
    let r = match_by_keywords(KeywordTable::builtin(), &req);

    assert!(r.score >= 70, "expected strong tier, got {r:?}");
    assert_eq!(r.strategy, Strategy::Keyword);
    assert!(
        r.reasons
            .iter()
            .any(|s| s.starts_with("Safety and certification credentials")),
        "missing safety/certification reason: {:?}",
        r.reasons
    );
    assert!(
        r.reasons
            .iter()
            .any(|s| s == "Experience in the required mining environment (underground)"),
        "missing environment reason: {:?}",
        r.reasons
    );
    assert!(r.reasons.iter().any(|s| s.starts_with("Strong match")));
    assert!(r.missing_skills.is_empty(), "{:?}", r.missing_skills);
    assert_eq!(r.recommendations.len(), 3);
    assert_eq!(r.provenance(), Some(Strategy::Keyword.provenance_reason()));
}

#[test]
fn office_administrator_is_a_weak_match_with_gaps() {
    let req = supervisor_job("office administrator, no mining background");
    let r = match_by_keywords(KeywordTable::builtin(), &req);

    assert!(r.score < 50, "expected weak tier, got {}", r.score);
    assert!(r.reasons.iter().any(|s| s.starts_with("Weak match")));
    assert!(r
        .missing_skills
        .contains(&"Mining safety certification or training".to_string()));
    assert!(r
        .missing_skills
        .contains(&"Relevant mining industry experience".to_string()));
    assert_eq!(r.recommendations.len(), 3);
}

#[test]
fn breakdown_of_reference_scenario() {
    let req = supervisor_job(
        "5 years underground mining experience, SAMTRAC certified, safety officer",
    );
    let b = KeywordTable::builtin().analyze(&req);
    assert_eq!(
        b.matched,
        vec!["years", "underground", "experience", "samtrac", "certified", "safety"]
    );
    // 5 + 15 + 10 + 25 + 15 + 20 + safety category bonus 10
    assert_eq!(b.raw_score, 100);
    assert_eq!(b.job_token_count, 14);
    assert_eq!(b.category_hits, vec![("safety".to_string(), 3)]);
    assert_eq!(b.score, 100);
}

#[test]
fn category_bonus_needs_two_terms() {
    let job = "Underground safety officer wanted for a large platinum operation near \
               Rustenburg with strong commitment to samtrac aligned training programs \
               across all shifts and teams";
    let both = match_by_keywords(
        KeywordTable::builtin(),
        &MatchRequest::new("safety samtrac", job, vec![]),
    );
    let one = match_by_keywords(
        KeywordTable::builtin(),
        &MatchRequest::new("safety", job, vec![]),
    );

    assert!(both.score > one.score, "{} vs {}", both.score, one.score);
    let bonus_reason = "Strong safety alignment (2 matching terms)";
    assert!(both.reasons.iter().any(|r| r == bonus_reason));
    assert!(!one.reasons.iter().any(|r| r.starts_with("Strong safety alignment")));
}

#[test]
fn missing_critical_terms_are_reported_in_fixed_order() {
    let r = match_by_keywords(
        KeywordTable::builtin(),
        &MatchRequest::new(
            "fitter with boilermaker background",
            "Certified fitter required, safety first",
            vec!["Licensed to work at heights".into()],
        ),
    );
    assert_eq!(
        r.missing_skills,
        vec![
            "Mining safety certification or training",
            "Relevant professional certification",
            "Required operating licence or ticket",
        ]
    );
}

#[test]
fn critical_term_in_candidate_is_not_missing() {
    let r = match_by_keywords(
        KeywordTable::builtin(),
        &MatchRequest::new("safety rep, certified rigger", "safety certified rigger", vec![]),
    );
    assert!(r.missing_skills.is_empty());
}

#[test]
fn empty_inputs_degrade_to_zero() {
    let r = match_by_keywords(KeywordTable::builtin(), &MatchRequest::default());
    assert_eq!(r.score, 0);
    assert!(!r.reasons.is_empty());
    assert!(r.reasons.iter().any(|s| s.starts_with("Weak match")));
    assert!(r.missing_skills.is_empty());
}

const VOCAB: &[&str] = &[
    "safety", "samtrac", "certified", "licensed", "experience", "years", "underground",
    "surface", "opencast", "drill", "blasting", "LHD", "operator", "engineer", "fitter",
    "surpac", "datamine", "geologist", "sampling", "supervisor", "office", "admin", "team",
    "the", "and", "with", "5+", "mine,", "(senior)", "ore-body", "crew", "shift", "", "a",
];

fn random_text(rng: &mut StdRng) -> String {
    let n = rng.random_range(0..16);
    (0..n)
        .filter_map(|_| VOCAB.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn seeded_sweep_bounds_provenance_and_determinism() {
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let table = KeywordTable::builtin();

    for _ in 0..300 {
        let reqs: Vec<String> = (0..rng.random_range(0..4))
            .map(|_| random_text(&mut rng))
            .collect();
        let req = MatchRequest::new(random_text(&mut rng), random_text(&mut rng), reqs);

        let a = match_by_keywords(table, &req);
        let b = match_by_keywords(table, &req);

        assert!(a.score <= 100);
        assert!(!a.reasons.is_empty());
        assert!(a.reasons.iter().all(|r| !r.is_empty()));
        assert_eq!(provenance_count(&a.reasons), 1, "{:?}", a.reasons);
        assert_eq!(a.provenance(), Some(Strategy::Keyword.provenance_reason()));
        assert_eq!(a, b, "keyword matcher must be deterministic for {req:?}");
    }
}
