use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue};
use kanji_quarry::config::Config;
use kanji_quarry::constants::SESSION_PRUNE_INTERVAL_SECS;
use kanji_quarry::logging::{init_tracing, LogConfig};
use kanji_quarry::quiz::engine::EngineSettings;
use kanji_quarry::quiz::{ItemCatalog, QuizEngine, SchedulerConfig};
use kanji_quarry::routes::build_router;
use kanji_quarry::state::AppState;
use kanji_quarry::store::Store;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const CSP_HEADER: &str = "default-src 'none'; frame-ancestors 'none'";
const HSTS_HEADER: &str = "max-age=31536000; includeSubDomains";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&LogConfig::from(&config));
    tracing::info!("Starting kanji-quarry");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    let catalog = Arc::new(ItemCatalog::load(&config.catalog_path)?);
    if catalog.is_empty() {
        tracing::warn!(path = %config.catalog_path, "Item catalog is empty, every session will be empty");
    }

    let store = Arc::new(Store::open(&config.sled_path)?);
    store.run_migrations()?;

    let scheduler = SchedulerConfig::default();
    scheduler.validate()?;

    let settings = EngineSettings {
        seed: config.scheduler.seed,
        session_ttl: Duration::from_secs(config.scheduler.session_ttl_mins * 60),
        ..EngineSettings::default()
    };
    if let Some(seed) = settings.seed {
        tracing::info!(seed, "Scheduler running with a fixed seed");
    }
    let engine = Arc::new(QuizEngine::new(catalog, store.clone(), scheduler, settings));

    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let pruner = tokio::spawn(prune_sessions_loop(engine.clone(), shutdown_tx.subscribe()));

    let state = AppState::new(store.clone(), engine, &config);
    let cors_layer = build_cors_layer(&config)?;

    let app = build_router(state)
        .layer(cors_layer)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static(CSP_HEADER),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static(HSTS_HEADER),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
        .await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    // 服务器异常退出时也要让后台任务停下
    let _ = shutdown_tx.send(());
    if let Err(e) = pruner.await {
        tracing::error!(error = %e, "Session pruner task panicked");
    }

    tracing::info!("Flushing store before exit");
    store.flush()?;
    tracing::info!("Shutdown complete");
    served.map_err(Into::into)
}

async fn prune_sessions_loop(engine: Arc<QuizEngine>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(SESSION_PRUNE_INTERVAL_SECS));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.prune_sessions().await;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Session pruner stopping");
                break;
            }
        }
    }
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, BoxError> {
    if config.cors_origin.trim() == "*" {
        // 通配符模式仅用于开发环境
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any));
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("invalid CORS_ORIGIN {:?}: {e}", config.cors_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_methods(Any))
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
