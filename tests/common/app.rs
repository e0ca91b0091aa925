use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;

use kanji_quarry::config::{Config, SchedulerEnvConfig};
use kanji_quarry::quiz::engine::EngineSettings;
use kanji_quarry::quiz::{ItemCatalog, QuizEngine, SchedulerConfig};
use kanji_quarry::routes::build_router;
use kanji_quarry::state::AppState;
use kanji_quarry::store::Store;

use super::fixtures::{fixed_today, fixture_catalog};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub async fn spawn_with_catalog(catalog: ItemCatalog) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("quarry-test.sled");

    // 直接构造 Config，避免 set_var 在并行测试中互相干扰
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        catalog_path: "unused.json".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        scheduler: SchedulerEnvConfig {
            seed: Some(42),
            session_ttl_mins: 30,
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let engine = Arc::new(QuizEngine::new(
        Arc::new(catalog),
        store.clone(),
        SchedulerConfig::default(),
        EngineSettings {
            seed: config.scheduler.seed,
            session_ttl: Duration::from_secs(config.scheduler.session_ttl_mins * 60),
            clock: fixed_today,
        },
    ));

    let state = AppState::new(store, engine, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_catalog(fixture_catalog(6)).await
}
