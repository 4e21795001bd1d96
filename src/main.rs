use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;

use abroad_counsel::api::{ApiState, api_routes};
use abroad_counsel::config::AppConfig;
use abroad_counsel::journey::JourneyService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // rig's HTTP client needs a process-wide rustls crypto provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("🎓 Abroad Counsel v{}", env!("CARGO_PKG_VERSION"));
    match &config.llm {
        Some(llm) => eprintln!("   Model: {} ({:?})", llm.model, llm.backend),
        None => eprintln!("   Model: none (canned advice only)"),
    }
    eprintln!("   Advice timeout: {:?}", config.advice.timeout);

    let service = Arc::new(
        JourneyService::open(&config)
            .await
            .context("starting journey service")?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    let app = api_routes(ApiState { service }).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    eprintln!("   API: http://{}/api", addr);
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
