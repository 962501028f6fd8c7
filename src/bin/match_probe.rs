//! Runs two reference candidates against one job through the configured chain
//! and prints each result as JSON (stdout). Logs go to stderr.

use mining_job_matcher::bootstrap::MatcherRuntime;
use mining_job_matcher::MatchRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rt = MatcherRuntime::from_default_config()?;

    let description = "Seeking underground safety supervisor with SAMTRAC certification";
    let requirements = vec![
        "SAMTRAC certified".to_string(),
        "5+ years underground experience".to_string(),
        "safety management".to_string(),
    ];
    let candidates = [
        "5 years underground mining experience, SAMTRAC certified, safety officer",
        "office administrator, no mining background",
    ];

    for candidate in candidates {
        let req = MatchRequest::new(candidate, description, requirements.clone());
        let result = rt.engine.match_candidate_to_job(&req).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    println!("match-probe done");
    Ok(())
}
