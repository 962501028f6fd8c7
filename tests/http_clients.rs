// tests/http_clients.rs
//
// Real HTTP round-trips against in-process axum stub servers bound to 127.0.0.1:0:
// - hosted chat-completions client: success, quota classification, API errors
// - local model client: health probe (ok / down / hung / refused) and chat parsing
// - full engine built from config, routed over the stubs

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use mining_job_matcher::bootstrap::build_engine;
use mining_job_matcher::config::{HostedConfig, LocalConfig, MatcherConfig};
use mining_job_matcher::matching::hosted::match_with_hosted;
use mining_job_matcher::matching::local::match_with_local;
use mining_job_matcher::matching::{
    ErrorKind, HealthGate, HttpLocalModelClient, LocalModelClient, MatchRequest,
    OpenAiCompletionClient, Strategy,
};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub");
    });
    format!("http://{addr}")
}

/// Captured (authorization header, JSON body) pairs.
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    seen: Seen,
}

async fn canned_handler(
    State(c): State<Canned>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    c.seen.lock().push((auth, body));
    (c.status, c.body)
}

async fn openai_stub(status: StatusCode, body: String) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let state = Canned {
        status,
        body,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/v1/chat/completions", post(canned_handler))
        .with_state(state);
    let base = spawn(router).await;
    (format!("{base}/v1/chat/completions"), seen)
}

fn chat_body(content: &str) -> String {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
        .to_string()
}

fn hosted_cfg(endpoint: String) -> HostedConfig {
    HostedConfig {
        endpoint,
        api_key: "sk-test".into(),
        timeout_secs: 5,
        ..HostedConfig::default()
    }
}

fn request() -> MatchRequest {
    MatchRequest::new(
        "LHD operator, 6 years underground, blasting ticket",
        "Underground LHD operator for a platinum mine",
        vec!["Valid LHD licence".into()],
    )
}

const VERDICT: &str = r#"{"score": 88, "reasons": ["LHD experience"], "recommendations": ["Apply"], "missingSkills": []}"#;

#[tokio::test]
async fn hosted_client_sends_json_mode_and_parses_verdict() {
    let (endpoint, seen) = openai_stub(StatusCode::OK, chat_body(VERDICT)).await;
    let client = OpenAiCompletionClient::new(&hosted_cfg(endpoint)).unwrap();

    let r = match_with_hosted(&client, &request()).await.expect("verdict");
    assert_eq!(r.score, 88);
    assert_eq!(r.strategy, Strategy::HostedModel);

    let seen = seen.lock();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["model"], "gpt-4o-mini");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.last().unwrap()["role"], "user");
    assert!(messages.last().unwrap()["content"]
        .as_str()
        .unwrap()
        .contains("Valid LHD licence"));
}

#[tokio::test]
async fn hosted_429_is_quota() {
    let (endpoint, _) = openai_stub(StatusCode::TOO_MANY_REQUESTS, "slow down".into()).await;
    let client = OpenAiCompletionClient::new(&hosted_cfg(endpoint)).unwrap();
    let err = match_with_hosted(&client, &request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Quota);
}

#[tokio::test]
async fn hosted_insufficient_quota_code_is_quota() {
    let body = json!({"error": {"message": "You exceeded your current quota",
                                "type": "insufficient_quota", "code": "insufficient_quota"}});
    let (endpoint, _) = openai_stub(StatusCode::FORBIDDEN, body.to_string()).await;
    let client = OpenAiCompletionClient::new(&hosted_cfg(endpoint)).unwrap();
    let err = match_with_hosted(&client, &request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Quota);
}

#[tokio::test]
async fn hosted_auth_error_is_transport() {
    let body = json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}});
    let (endpoint, _) = openai_stub(StatusCode::UNAUTHORIZED, body.to_string()).await;
    let client = OpenAiCompletionClient::new(&hosted_cfg(endpoint)).unwrap();
    let err = match_with_hosted(&client, &request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn hosted_prose_content_is_malformed() {
    let (endpoint, _) =
        openai_stub(StatusCode::OK, chat_body("The candidate looks good, maybe 80.")).await;
    let client = OpenAiCompletionClient::new(&hosted_cfg(endpoint)).unwrap();
    let err = match_with_hosted(&client, &request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

/* ----------------------------
Local model stub
---------------------------- */

#[derive(Clone, Copy)]
enum Health {
    Up,
    Down,
    Hang,
}

#[derive(Clone)]
struct LocalStub {
    health: Health,
    reply: &'static str,
    seen: Seen,
}

async fn local_health(State(s): State<LocalStub>) -> StatusCode {
    match s.health {
        Health::Up => StatusCode::OK,
        Health::Down => StatusCode::SERVICE_UNAVAILABLE,
        Health::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }
    }
}

async fn local_chat(
    State(s): State<LocalStub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    s.seen.lock().push((auth, body));
    Json(json!({ "response": s.reply }))
}

async fn local_stub(health: Health, reply: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let state = LocalStub {
        health,
        reply,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/health", get(local_health))
        .route("/chat", post(local_chat))
        .with_state(state);
    (spawn(router).await, seen)
}

fn local_cfg(base_url: String, api_key: &str) -> LocalConfig {
    LocalConfig {
        base_url,
        api_key: api_key.into(),
        health_timeout_secs: 5,
        request_timeout_secs: 5,
        ..LocalConfig::default()
    }
}

const LOCAL_REPLY: &str =
    r#"Based on the profile: {"score": 73, "reasons": ["Underground LHD hours"], "missingSkills": ["Licence upgrade"]} Let me know!"#;

#[tokio::test]
async fn local_client_posts_prompt_and_extracts_json() {
    let (base, seen) = local_stub(Health::Up, LOCAL_REPLY).await;
    let client = HttpLocalModelClient::new(&local_cfg(format!("{base}/"), "local-token")).unwrap();

    client.health().await.expect("healthy");
    let r = match_with_local(&client, &request()).await.expect("verdict");
    assert_eq!(r.score, 73);
    assert_eq!(r.strategy, Strategy::LocalModel);
    assert_eq!(r.missing_skills, vec!["Licence upgrade"]);

    let seen = seen.lock();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer local-token"));
    assert!(body["prompt"].as_str().unwrap().contains("LHD operator"));
}

#[tokio::test]
async fn local_client_without_key_sends_no_auth() {
    let (base, seen) = local_stub(Health::Up, LOCAL_REPLY).await;
    let client = HttpLocalModelClient::new(&local_cfg(base, "")).unwrap();
    match_with_local(&client, &request()).await.expect("verdict");
    assert_eq!(seen.lock()[0].0, None);
}

#[tokio::test]
async fn health_gate_reports_down_service() {
    let (base, _) = local_stub(Health::Down, LOCAL_REPLY).await;
    let client = HttpLocalModelClient::new(&local_cfg(base, "")).unwrap();
    let gate = HealthGate::new(Duration::from_secs(5), Duration::ZERO);
    assert!(!gate.is_available(&client).await);
}

#[tokio::test]
async fn health_gate_bounds_a_hung_probe() {
    let (base, _) = local_stub(Health::Hang, LOCAL_REPLY).await;
    let client = HttpLocalModelClient::new(&local_cfg(base, "")).unwrap();
    let gate = HealthGate::new(Duration::from_millis(200), Duration::ZERO);

    let started = Instant::now();
    assert!(!gate.is_available(&client).await);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn health_gate_reports_refused_connection() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpLocalModelClient::new(&local_cfg(format!("http://{addr}"), "")).unwrap();
    let gate = HealthGate::new(Duration::from_secs(5), Duration::ZERO);
    assert!(!gate.is_available(&client).await);
}

/* ----------------------------
Engine over HTTP
---------------------------- */

fn engine_cfg(hosted_endpoint: String, local_base: String) -> MatcherConfig {
    MatcherConfig {
        hosted: hosted_cfg(hosted_endpoint),
        local: local_cfg(local_base, ""),
        ..MatcherConfig::default()
    }
}

#[tokio::test]
async fn engine_routes_quota_to_live_local_model() {
    let (endpoint, _) = openai_stub(StatusCode::TOO_MANY_REQUESTS, "{}".into()).await;
    let (base, seen) = local_stub(Health::Up, LOCAL_REPLY).await;
    let engine = build_engine(&engine_cfg(endpoint, base)).unwrap();

    let r = engine.match_candidate_to_job(&request()).await;
    assert_eq!(r.strategy, Strategy::LocalModel);
    assert_eq!(r.score, 73);
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn engine_routes_quota_past_dead_local_model_to_keywords() {
    let (endpoint, _) = openai_stub(StatusCode::TOO_MANY_REQUESTS, "{}".into()).await;
    let (base, seen) = local_stub(Health::Down, LOCAL_REPLY).await;
    let engine = build_engine(&engine_cfg(endpoint, base)).unwrap();

    let r = engine.match_candidate_to_job(&request()).await;
    assert_eq!(r.strategy, Strategy::Keyword);
    assert!(r.score > 0);
    assert!(seen.lock().is_empty(), "chat must not be called when health fails");
}

#[tokio::test]
async fn engine_returns_degraded_result_on_hosted_server_error() {
    let (endpoint, _) = openai_stub(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()).await;
    let (base, seen) = local_stub(Health::Up, LOCAL_REPLY).await;
    let engine = build_engine(&engine_cfg(endpoint, base)).unwrap();

    let r = engine.match_candidate_to_job(&request()).await;
    assert_eq!(r.strategy, Strategy::Unavailable);
    assert_eq!(r.score, 0);
    assert!(seen.lock().is_empty());
}
