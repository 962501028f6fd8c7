//! Job matcher service: binary entrypoint.
//! Boots the Axum HTTP server: config → match engine → routes (+ /metrics).

use mining_job_matcher::api::{self, AppState};
use mining_job_matcher::bootstrap::MatcherRuntime;
use mining_job_matcher::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tracing setup: `RUST_LOG` wins, else `mining_job_matcher=info,matching=info,warn`.
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mining_job_matcher=info,matching=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    // try_init: the shuttle runtime may already have installed a subscriber
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let runtime = MatcherRuntime::from_default_config()?;
    let state = AppState::new(runtime.engine.clone());

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
