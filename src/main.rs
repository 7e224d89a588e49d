use std::sync::Arc;
use std::time::Duration;

use holiday_match::{
    api::{create_router, AppState},
    cache::{create_redis_client, Cache, CacheWriterHandle},
    config::Config,
    models::Questionnaire,
    services::{
        providers::{
            openai::OpenAiRecommender,
            tripadvisor::TripAdvisorProvider,
        },
        FlowOrchestrator,
    },
    session::SessionStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("holiday_match=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client).await;
            tracing::info!("Redis cache enabled for location lookups");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, location lookups are not cached");
            (None, None)
        }
    };

    let questionnaire = match &config.questionnaire_path {
        Some(path) => Questionnaire::from_file(path)?,
        None => Questionnaire::default(),
    };
    tracing::info!(steps = questionnaire.step_count(), "Questionnaire loaded");

    let recommender = OpenAiRecommender::new(config.openai())?;
    let locations = TripAdvisorProvider::new(config.tripadvisor(), cache)?;
    let flow = FlowOrchestrator::new(
        Arc::new(recommender),
        Arc::new(locations),
        config.recommendation_timeout(),
        config.location_timeout(),
    );

    let state = AppState::new(flow, questionnaire);
    spawn_session_purge(state.sessions.clone(), config.session_idle());

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        flush_cache(handle).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically drops sessions nobody has touched for `max_idle`
fn spawn_session_purge(sessions: SessionStore, max_idle: chrono::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            sessions.purge_idle(max_idle).await;
        }
    });
}

async fn flush_cache(handle: CacheWriterHandle) {
    handle.shutdown().await;
    // Give the writer a moment to drain queued writes
    tokio::time::sleep(Duration::from_millis(100)).await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
