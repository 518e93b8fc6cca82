use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use studyai_gateway::config::Args;
use studyai_gateway::load_balancer::health_checker;
use studyai_gateway::rate_limit::{AdmissionController, run_sweeper};
use studyai_gateway::router;
use studyai_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyai_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let default_policy = args.default_policy();

    let admission = AdmissionController::in_memory(default_policy);
    let state = AppState::start(&args.backends, args.cache_ttl(), admission.clone())?;

    tokio::spawn(health_checker(
        Arc::clone(&state.load_balancer),
        state.client.clone(),
        args.health_interval(),
    ));
    tokio::spawn(run_sweeper(admission, args.sweep_interval(), args.idle_ttl()));

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "gateway listening");
    tracing::info!(
        max_requests = default_policy.max_requests,
        window_secs = default_policy.window.as_secs(),
        lockout_secs = default_policy.lockout.as_secs(),
        cache_ttl_secs = args.cache_ttl,
        "default admission policy"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
