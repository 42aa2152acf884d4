//! HTTP surface exercised through the router without binding a socket
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use proposta_api::{create_app, AppState};
use proposta_validation::ValidationConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    create_app(Arc::new(AppState::new(None).unwrap()))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn solar_products(panel_price: f64) -> Value {
    json!([
        {
            "id": "p550",
            "name": "Painel Solar 550W",
            "category": "energia_solar",
            "solar_category": "painel",
            "base_price": panel_price,
            "specifications": { "power_rating": 550 }
        },
        {
            "id": "inv5",
            "name": "Inversor On-Grid 5 kW",
            "category": "energia_solar",
            "solar_category": "inversor",
            "base_price": 5000.0,
            "specifications": { "power": 5 }
        }
    ])
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_text(app(), "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_shingle_envelope() {
    let (status, body) = post(
        app(),
        "/v1/calc/shingle",
        json!({ "input": { "roof_area": 100.0, "roof_slope": 25.0, "complexity": "simple" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["calculation_id"].as_str().unwrap().len() == 36);
    assert!(body["calculated_at"].is_string());
    assert_eq!(body["result"]["shingle_bundles"], 38);
    assert!(body["result"]["itemizedCosts"].is_object());
    assert!(body["result"]["totalCost"].is_number());
}

#[tokio::test]
async fn test_solar_lenient_without_products() {
    let (status, body) = post(
        app(),
        "/v1/calc/solar",
        json!({ "input": { "monthly_consumption_kwh": 600.0, "peak_sun_hours": 5.0 } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["panel_count"], 10);
    assert_eq!(body["result"]["totalCost"], 0.0);
}

#[tokio::test]
async fn test_solar_advanced_rejects_zero_priced_panel() {
    let (status, body) = post(
        app(),
        "/v1/calc/solar-advanced",
        json!({
            "input": { "monthly_consumption_kwh": 600.0, "peak_sun_hours": 5.0 },
            "products": solar_products(0.0),
            "strictness": "lenient"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PRICE");
    assert!(body["error"].as_str().unwrap().contains("Painel Solar 550W"));
}

#[tokio::test]
async fn test_request_strictness_overrides_domain_default() {
    let input = json!({ "roof_area": 50.0, "roof_slope": 30.0 });

    let (status, _) = post(app(), "/v1/calc/shingle", json!({ "input": input })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        app(),
        "/v1/calc/shingle",
        json!({ "input": input, "strictness": "strict" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CATALOG");
}

#[tokio::test]
async fn test_server_profile_sets_default_strictness() {
    let state = AppState::new(Some(ValidationConfig::strict())).unwrap();
    let app = create_app(Arc::new(state));
    let (status, body) = post(
        app,
        "/v1/calc/shingle",
        json!({ "input": { "roof_area": 50.0, "roof_slope": 30.0 } }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CATALOG");
}

#[tokio::test]
async fn test_battery_backup_requires_catalog() {
    let (status, body) = post(
        app(),
        "/v1/calc/battery-backup",
        json!({
            "input": {
                "loads": [{ "name": "Geladeira", "power_w": 150.0, "quantity": 1 }],
                "autonomy_hours": 8.0
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CATALOG");
    assert!(body["error"].as_str().unwrap().contains("battery_backup"));
}

#[tokio::test]
async fn test_lenient_profile_keeps_battery_backup_strict() {
    let state = AppState::new(Some(ValidationConfig::lenient())).unwrap();
    let app = create_app(Arc::new(state));
    let (status, body) = post(
        app,
        "/v1/calc/battery-backup",
        json!({
            "input": {
                "loads": [{ "name": "Geladeira", "power_w": 150.0, "quantity": 1 }],
                "autonomy_hours": 8.0
            },
            "products": [],
            "strictness": "lenient"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CATALOG");
}

#[tokio::test]
async fn test_validate_products() {
    let (status, body) = post(
        app(),
        "/v1/products/validate",
        json!({
            "products": solar_products(0.0),
            "requiredCategories": ["energia_solar", "battery_backup"],
            "config": { "strictValidation": true, "blockZeroPrices": true }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["canProceed"], false);
    assert!(body["errors"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_commission() {
    let rules = json!([
        { "id": "t1", "discount_min": 0.0, "discount_max": 5.0, "commission_rate": 5.0 },
        { "id": "t2", "discount_min": 5.01, "discount_max": 10.0, "commission_rate": 3.0 }
    ]);

    let (status, body) = post(
        app(),
        "/v1/commission",
        json!({ "rules": rules, "proposal_value": 10000.0, "discount_percentage": 8.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["rule_id"], "t2");
    assert_eq!(body["result"]["commission_value"], 276.0);

    let (status, body) = post(
        app(),
        "/v1/commission",
        json!({ "rules": rules, "proposal_value": 10000.0, "discount_percentage": 20.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "RULES");
}

#[tokio::test]
async fn test_commission_rejects_overlapping_rules() {
    let (status, body) = post(
        app(),
        "/v1/commission",
        json!({
            "rules": [
                { "id": "a", "discount_min": 0.0, "discount_max": 10.0, "commission_rate": 4.0 },
                { "id": "b", "discount_min": 10.0, "discount_max": 20.0, "commission_rate": 2.0 }
            ],
            "proposal_value": 1000.0,
            "discount_percentage": 5.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("overlapping"));
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let app = app();
    post(
        app.clone(),
        "/v1/calc/floor-leveling",
        json!({ "input": { "area": 20.0, "min_thickness_mm": 3.0, "max_thickness_mm": 8.0 } }),
    )
    .await;
    post(
        app.clone(),
        "/v1/calc/floor-leveling",
        json!({ "input": { "area": 20.0, "min_thickness_mm": 9.0, "max_thickness_mm": 3.0 } }),
    )
    .await;

    let (status, text) = get_text(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        text.contains(r#"proposta_calculations_total{domain="floor_leveling",outcome="ok"} 1"#)
    );
    assert!(
        text.contains(r#"proposta_calculations_total{domain="floor_leveling",outcome="error"} 1"#)
    );
}
