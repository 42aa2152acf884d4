//! Proposta API /v1: JSON endpoints over the calculators, the product
//! validator and commission rules
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use config::ServerConfig;
use metrics::Metrics;
use proposta_core::Strictness;
use proposta_validation::ValidationConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub metrics: Metrics,
    /// Profile used by `/v1/products/validate` when the body has none
    pub validation: ValidationConfig,
    /// Set when a validation profile was loaded at startup
    pub default_strictness: Option<Strictness>,
}

impl AppState {
    pub fn new(validation: Option<ValidationConfig>) -> Result<Self, prometheus::Error> {
        let default_strictness = validation.as_ref().map(ValidationConfig::strictness);
        Ok(Self {
            metrics: Metrics::new()?,
            validation: validation.unwrap_or_default(),
            default_strictness,
        })
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/calc/shingle", post(handlers::shingle))
        .route("/v1/calc/shingle-roof", post(handlers::shingle_roof))
        .route("/v1/calc/drywall-ceiling", post(handlers::drywall_ceiling))
        .route("/v1/calc/solar", post(handlers::solar))
        .route("/v1/calc/solar-advanced", post(handlers::solar_advanced))
        .route("/v1/calc/battery-backup", post(handlers::battery_backup))
        .route("/v1/calc/waterproofing", post(handlers::waterproofing))
        .route("/v1/calc/floor-leveling", post(handlers::floor_leveling))
        .route("/v1/products/validate", post(handlers::validate_products))
        .route("/v1/commission", post(handlers::commission))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::request_timing))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let validation = config.load_validation()?;
    if let Some(profile) = &validation {
        tracing::info!(strict = profile.strict_validation, "validation profile loaded");
    }
    let state = Arc::new(AppState::new(validation)?);
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    tracing::info!("Proposta API listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
