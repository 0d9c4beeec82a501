use std::path::PathBuf;
use std::sync::Arc;

use bazaar_identity::TokenService;
use r2e::prelude::*;
use r2e::r2e_observability::{Observability, ObservabilityConfig};
use r2e::r2e_prometheus::Prometheus;
use r2e::r2e_scheduler::Scheduler;
use semantic_cache::{CacheIndex, InsertLog};

mod control_plane;
mod controllers;
mod dto;
mod identity;
mod state;

use control_plane::ControlPlaneClient;
use controllers::{CacheController, RefreshJob};
use state::{AppState, CacheServiceConfig};

#[tokio::main]
async fn main() {
    r2e::init_tracing();

    let config = R2eConfig::load("dev").unwrap_or_else(|_| R2eConfig::empty());

    let store_dir = PathBuf::from(std::env::var("CACHE_STORE_DIR").unwrap_or_else(|_| "./data/llm_cache".into()));
    let insertions_dir = store_dir.join("insertions");
    std::fs::create_dir_all(&insertions_dir).expect("failed to create the cache insertion log directory");

    let index = Arc::new(CacheIndex::new());
    let insert_log = Arc::new(InsertLog::new(insertions_dir));
    let permission_cache = Arc::new(state::default_permission_cache());

    let token_secret = std::env::var("BAZAAR_TOKEN_SECRET").unwrap_or_else(|_| "bazaar-dev-secret-change-in-production".into());
    let tokens = Arc::new(TokenService::new(token_secret.into_bytes()));

    let control_plane_url = std::env::var("CONTROL_PLANE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let control_plane = Arc::new(ControlPlaneClient::new(control_plane_url));

    let service = CacheServiceConfig { store_dir };

    AppBuilder::new()
        .plugin(Scheduler)
        .provide(config.clone())
        .provide(index)
        .provide(insert_log)
        .provide(permission_cache)
        .provide(tokens)
        .provide(control_plane)
        .provide(service)
        .build_state::<AppState, _, _>()
        .await
        .with_config(config)
        .with(Health)
        .with(Prometheus::builder().endpoint("/metrics").namespace("cache_service").exclude_path("/health").exclude_path("/metrics").build())
        .with(SecureHeaders::default())
        .with(Observability::new(ObservabilityConfig::new("cache-service").with_service_version(env!("CARGO_PKG_VERSION"))))
        .with(ErrorHandling)
        .register_controller::<CacheController>()
        .register_controller::<RefreshJob>()
        .with(NormalizePath)
        .serve("0.0.0.0:8091")
        .await
        .unwrap();
}
