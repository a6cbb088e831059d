use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use sq_api::{ApiConfig, ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    // Held for the whole run so the log file writer keeps flushing
    let _log_guard = sq_api::tracing::init_tracing(&config.env, config.log_dir.as_deref());

    let metrics_handle = sq_api::metrics::init_metrics()?;
    tracing::info!("Prometheus metrics exporter initialized");

    let pool = sq_db::create_pool(&config.database_url, config.database_max_connections).await?;
    sq_db::ensure_db_and_migrate(&config.database_url, &pool).await?;

    sq_api::auth::bootstrap::ensure_bootstrap_admin(&pool, &config)
        .await
        .context("failed to bootstrap the admin account")?;

    let state = ApiState::new(&config, pool)?;

    let _job_handles = sq_api::jobs::start_background_jobs(state.pool.clone(), config.retention_days);
    tracing::info!("Background jobs started (invitation cleanup, soft-delete purge)");

    let cors = sq_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_app = Router::new()
        .route("/metrics", get(sq_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    // Rate limits are applied per route group inside the router
    let app = sq_api::router::router()
        .merge(metrics_app)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(sq_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            sq_api::middleware::request_id::request_id_middleware,
        ));

    let app =
        sq_api::middleware::security_headers::apply_security_headers(app, config.env.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Environment: {:?}", config.env);
    tracing::info!("Server listening on http://{addr}");

    // Peer addresses are needed by the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
