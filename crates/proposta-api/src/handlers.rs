//! API handlers
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use proposta_calc::{
    calculate_battery_backup, calculate_drywall_ceiling, calculate_floor_leveling,
    calculate_shingle, calculate_shingle_roof, calculate_solar, calculate_waterproofing,
    BatteryBackupInput, BatteryBackupResult, DrywallCeilingInput, DrywallCeilingResult,
    FloorLevelingInput, FloorLevelingResult, ShingleCalculationInput, ShingleCalculationResult,
    ShingleRoofInput, ShingleRoofResult, SolarCalculationInput, SolarCalculationResult,
    WaterproofingInput, WaterproofingResult,
};
use proposta_commission::{CommissionCalculation, CommissionRule, CommissionRuleSet};
use proposta_core::{CalcResult, Catalog, Product, Strictness};
use proposta_validation::{ProductValidationReport, ProductValidator, ValidationConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Body shared by every calculator route
#[derive(Debug, Deserialize)]
pub struct CalcRequest<I> {
    pub input: I,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub strictness: Option<Strictness>,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub calculation_id: Uuid,
    pub calculated_at: DateTime<Utc>,
    pub result: T,
}

impl<T> Envelope<T> {
    pub fn new(result: T) -> Self {
        Self {
            calculation_id: Uuid::new_v4(),
            calculated_at: Utc::now(),
            result,
        }
    }
}

type CalcResponse<R> = Result<Json<Envelope<R>>, ApiError>;

/// Policy for one call. Fail-fast domains (battery backup, advanced solar)
/// stay strict whatever the request or the server profile says; elsewhere
/// the request field wins, then the server profile, then the domain default.
pub fn resolve_strictness(
    requested: Option<Strictness>,
    profile: Option<Strictness>,
    domain_default: Strictness,
) -> Strictness {
    if domain_default.is_strict() {
        return Strictness::Strict;
    }
    requested.or(profile).unwrap_or(domain_default)
}

fn run_calc<I, R>(
    state: &AppState,
    domain: &str,
    request: CalcRequest<I>,
    domain_default: Strictness,
    calculate: impl FnOnce(&I, &Catalog, Strictness) -> CalcResult<R>,
) -> CalcResponse<R> {
    let strictness =
        resolve_strictness(request.strictness, state.default_strictness, domain_default);
    let catalog = Catalog::from_products(request.products);
    let outcome = calculate(&request.input, &catalog, strictness);
    state.metrics.record(domain, outcome.is_ok());
    match outcome {
        Ok(result) => Ok(Json(Envelope::new(result))),
        Err(err) => {
            tracing::warn!(domain, code = err.code(), error = %err, "calculation rejected");
            Err(err.into())
        }
    }
}

pub async fn shingle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<ShingleCalculationInput>>,
) -> CalcResponse<ShingleCalculationResult> {
    run_calc(&state, "shingle", request, Strictness::Lenient, calculate_shingle)
}

pub async fn shingle_roof(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<ShingleRoofInput>>,
) -> CalcResponse<ShingleRoofResult> {
    run_calc(&state, "shingle_roof", request, Strictness::Lenient, calculate_shingle_roof)
}

pub async fn drywall_ceiling(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<DrywallCeilingInput>>,
) -> CalcResponse<DrywallCeilingResult> {
    run_calc(
        &state,
        "drywall_ceiling",
        request,
        Strictness::Lenient,
        calculate_drywall_ceiling,
    )
}

pub async fn solar(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<SolarCalculationInput>>,
) -> CalcResponse<SolarCalculationResult> {
    run_calc(&state, "solar", request, Strictness::Lenient, calculate_solar)
}

/// Always strict; a `strictness` field in the body is ignored
pub async fn solar_advanced(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<SolarCalculationInput>>,
) -> CalcResponse<SolarCalculationResult> {
    run_calc(&state, "solar_advanced", request, Strictness::Strict, calculate_solar)
}

pub async fn battery_backup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<BatteryBackupInput>>,
) -> CalcResponse<BatteryBackupResult> {
    run_calc(
        &state,
        "battery_backup",
        request,
        Strictness::Strict,
        calculate_battery_backup,
    )
}

pub async fn waterproofing(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<WaterproofingInput>>,
) -> CalcResponse<WaterproofingResult> {
    run_calc(
        &state,
        "waterproofing",
        request,
        Strictness::Lenient,
        calculate_waterproofing,
    )
}

pub async fn floor_leveling(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalcRequest<FloorLevelingInput>>,
) -> CalcResponse<FloorLevelingResult> {
    run_calc(
        &state,
        "floor_leveling",
        request,
        Strictness::Lenient,
        calculate_floor_leveling,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub products: Vec<Product>,
    pub required_categories: Vec<String>,
    /// Overrides the server profile for this request
    #[serde(default)]
    pub config: Option<ValidationConfig>,
}

pub async fn validate_products(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ProductValidationReport> {
    let config = request.config.unwrap_or_else(|| state.validation.clone());
    let categories: Vec<&str> = request.required_categories.iter().map(String::as_str).collect();
    let report = ProductValidator::new(config).validate(&request.products, &categories);
    Json(report)
}

#[derive(Debug, Deserialize)]
pub struct CommissionRequest {
    pub rules: Vec<CommissionRule>,
    pub proposal_value: f64,
    pub discount_percentage: f64,
}

pub async fn commission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommissionRequest>,
) -> CalcResponse<CommissionCalculation> {
    let outcome = CommissionRuleSet::new(request.rules)
        .map_err(ApiError::from)
        .and_then(|rules| {
            rules
                .calculate(request.proposal_value, request.discount_percentage)
                .ok_or(ApiError::NoCommissionRule {
                    discount: request.discount_percentage,
                })
        });
    state.metrics.record("commission", outcome.is_ok());
    outcome.map(|calc| Json(Envelope::new(calc)))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        ),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                err.to_string(),
            )
        }
    }
}
