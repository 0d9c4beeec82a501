use std::sync::Arc;

use bazaar_catalog::repository::{JobMessageRepository, ModelRepository, UserRepository};
use bazaar_identity::TokenService;
use bazaar_orchestrator::license::{EnvLicenseChecker, LicenseChecker};
use bazaar_orchestrator::runner::{HttpJobRunner, JobRunner, MockJobRunner};
use bazaar_storage::{ArtifactStore, LocalArtifactStore};
use r2e::prelude::*;
use r2e::r2e_openapi::{OpenApiConfig, OpenApiPlugin};
use r2e::r2e_observability::{Observability, ObservabilityConfig};
use r2e::r2e_prometheus::Prometheus;
use sqlx::postgres::PgPoolOptions;

mod basic_auth;
mod controllers;
mod dto;
mod identity;
mod services;
mod state;
mod validate;

use controllers::{DeployController, IdentityController, ModelController, TeamController, TrainController, UploadController};
use state::AppState;

fn runner_from_env() -> Arc<dyn JobRunner> {
    match std::env::var("BAZAAR_RUNNER_URL") {
        Ok(url) => Arc::new(HttpJobRunner::new(url)),
        Err(_) => Arc::new(MockJobRunner::default()),
    }
}

#[tokio::main]
async fn main() {
    r2e::init_tracing();

    let config = R2eConfig::load("dev").unwrap_or_else(|_| R2eConfig::empty());

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/bazaar".into());
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("failed to connect to the catalog database");

    sqlx::migrate!("../bazaar-catalog/migrations").run(&pool).await.expect("failed to run catalog migrations");

    let token_secret = std::env::var("BAZAAR_TOKEN_SECRET").unwrap_or_else(|_| "bazaar-dev-secret-change-in-production".into());
    let tokens = Arc::new(TokenService::new(token_secret.into_bytes()));

    let artifact_dir = std::env::var("BAZAAR_ARTIFACT_DIR").unwrap_or_else(|_| "./data/artifacts".into());
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(LocalArtifactStore::new(artifact_dir));

    let runner = runner_from_env();
    let license: Arc<dyn LicenseChecker> = Arc::new(EnvLicenseChecker::from_env());

    AppBuilder::new()
        .provide(pool.clone())
        .provide(config.clone())
        .provide(tokens)
        .provide(artifacts)
        .provide(runner)
        .provide(license)
        .with_bean::<UserRepository>()
        .with_bean::<ModelRepository>()
        .with_bean::<JobMessageRepository>()
        .with_bean::<services::IdentityService>()
        .with_bean::<services::ModelService>()
        .with_bean::<services::UploadService>()
        .with_bean::<services::TrainService>()
        .with_bean::<services::DeployService>()
        .with_bean::<services::TeamService>()
        .build_state::<AppState, _, _>()
        .await
        .with_config(config)
        .with(Health)
        .with(Prometheus::builder().endpoint("/metrics").namespace("bazaar").exclude_path("/health").exclude_path("/metrics").build())
        .with(Cors::permissive())
        .with(SecureHeaders::default())
        .with(Observability::new(ObservabilityConfig::new("bazaar").with_service_version(env!("CARGO_PKG_VERSION"))))
        .with(ErrorHandling)
        .with(OpenApiPlugin::new(
            OpenApiConfig::new("Bazaar model control plane", env!("CARGO_PKG_VERSION"))
                .with_description("Catalog, identity, permissions, artifact upload/download, and training/deployment orchestration")
                .with_docs_ui(true),
        ))
        .register_controller::<IdentityController>()
        .register_controller::<ModelController>()
        .register_controller::<UploadController>()
        .register_controller::<TrainController>()
        .register_controller::<DeployController>()
        .register_controller::<TeamController>()
        .with(NormalizePath)
        .serve("0.0.0.0:8080")
        .await
        .unwrap();
}
