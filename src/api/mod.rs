use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    CHECKPOINT_YEARS, Checkpoint, Comparison, ComparisonCache, Configuration, GROWTH_FLOOR,
    MONTH_RANGE, RentBasis, RentTaxMode, SHARE_RANGE,
};

pub const MAX_HORIZON_YEARS: u32 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("invalid query string: {0}")]
    InvalidQuery(String),
    #[error("years must be between 1 and {max}, got {got}")]
    HorizonOutOfRange { got: u32, max: u32 },
    #[error("rentalYieldPct and monthlyRentReceived are mutually exclusive")]
    ConflictingRentBasis,
    #[error("rentIndexedToInflation only applies together with monthlyRentReceived")]
    IndexingWithoutFixedRent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRentTaxMode {
    #[serde(alias = "blindDeduction", alias = "blind_deduction", alias = "blind")]
    BlindDeduction,
    #[serde(alias = "realExpenses", alias = "real_expenses", alias = "real")]
    RealExpenses,
}

impl From<ApiRentTaxMode> for RentTaxMode {
    fn from(value: ApiRentTaxMode) -> Self {
        match value {
            ApiRentTaxMode::BlindDeduction => RentTaxMode::BlindDeduction,
            ApiRentTaxMode::RealExpenses => RentTaxMode::RealExpenses,
        }
    }
}

/// Request shape shared by the HTTP API and the CLI's `--config` file.
/// Absent fields fall back to [`Configuration::default`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparePayload {
    years: Option<u32>,

    price: Option<f64>,
    purchase_cost_pct: Option<f64>,
    inflation_pct: Option<f64>,
    real_appreciation_pct: Option<f64>,
    property_tax_pct: Option<f64>,
    maintenance_months: Option<f64>,

    rental_yield_pct: Option<f64>,
    monthly_rent_received: Option<f64>,
    rent_indexed_to_inflation: Option<bool>,
    top_up_buy: Option<f64>,
    vacancy_months: Option<f64>,
    insurance: Option<f64>,
    condo_fee: Option<f64>,
    management_fee_pct: Option<f64>,
    capex_amount: Option<f64>,
    capex_interval_years: Option<u32>,
    sale_commission_pct: Option<f64>,
    sale_closing_cost_pct: Option<f64>,

    rent_tax_mode: Option<ApiRentTaxMode>,
    blind_deduction_pct: Option<f64>,
    rent_tax_rate_pct: Option<f64>,

    monthly_rent_paid: Option<f64>,
    rent_paid_indexed_to_inflation: Option<bool>,
    investment_rate_pct: Option<f64>,
    top_up_invest: Option<f64>,

    interest_tax_rate_pct: Option<f64>,
    tax_only_real_interest: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    configuration: Configuration,
    comparison: Comparison,
    checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone, Default)]
struct AppState {
    cache: Arc<Mutex<ComparisonCache>>,
}

impl AppState {
    fn cache(&self) -> MutexGuard<'_, ComparisonCache> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Turns a possibly non-finite number into a usable one: non-finite values
/// become zero, then the optional bounds apply.
pub fn normalize_number(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut n = if value.is_finite() { value } else { 0.0 };
    if let Some(min) = min {
        n = n.max(min);
    }
    if let Some(max) = max {
        n = n.min(max);
    }
    n
}

fn share(value: f64) -> f64 {
    normalize_number(value, Some(SHARE_RANGE.0), Some(SHARE_RANGE.1))
}

fn months(value: f64) -> f64 {
    normalize_number(value, Some(MONTH_RANGE.0), Some(MONTH_RANGE.1))
}

fn growth(value: f64) -> f64 {
    normalize_number(value, Some(GROWTH_FLOOR), None)
}

fn amount(value: f64) -> f64 {
    normalize_number(value, Some(0.0), None)
}

fn signed(value: f64) -> f64 {
    normalize_number(value, None, None)
}

/// Accepts horizons in `1..=MAX_HORIZON_YEARS`.
pub fn validate_horizon(years: u32) -> Result<u32, InputError> {
    if years == 0 || years > MAX_HORIZON_YEARS {
        return Err(InputError::HorizonOutOfRange {
            got: years,
            max: MAX_HORIZON_YEARS,
        });
    }
    Ok(years)
}

pub fn payload_from_json(json: &str) -> Result<ComparePayload, InputError> {
    serde_json::from_str::<ComparePayload>(json).map_err(|e| InputError::InvalidJson(e.to_string()))
}

pub fn config_from_payload(payload: ComparePayload) -> Result<Configuration, InputError> {
    let mut config = Configuration::default();

    if let Some(v) = payload.years {
        config.years = validate_horizon(v)?;
    }

    if let Some(v) = payload.price {
        config.price = amount(v);
    }
    if let Some(v) = payload.purchase_cost_pct {
        config.purchase_cost_pct = share(v);
    }
    if let Some(v) = payload.inflation_pct {
        config.annual_inflation_pct = growth(v);
    }
    if let Some(v) = payload.real_appreciation_pct {
        config.real_appreciation_pct = growth(v);
    }
    if let Some(v) = payload.property_tax_pct {
        config.property_tax_pct = share(v);
    }
    if let Some(v) = payload.maintenance_months {
        config.maintenance_months_per_year = months(v);
    }

    config.rent_basis = match (
        payload.rental_yield_pct,
        payload.monthly_rent_received,
        payload.rent_indexed_to_inflation,
    ) {
        (Some(_), Some(_), _) => return Err(InputError::ConflictingRentBasis),
        (_, None, Some(_)) => return Err(InputError::IndexingWithoutFixedRent),
        (Some(pct), None, None) => RentBasis::Yield {
            rental_yield_pct: share(pct),
        },
        (None, Some(monthly), indexed) => RentBasis::Fixed {
            monthly_rent_received: amount(monthly),
            indexed_to_inflation: indexed.unwrap_or(true),
        },
        (None, None, None) => config.rent_basis,
    };

    if let Some(v) = payload.top_up_buy {
        config.annual_top_up_buy = signed(v);
    }
    if let Some(v) = payload.vacancy_months {
        config.vacancy_months_per_year = months(v);
    }
    if let Some(v) = payload.insurance {
        config.annual_insurance = amount(v);
    }
    if let Some(v) = payload.condo_fee {
        config.monthly_condo_fee = amount(v);
    }
    if let Some(v) = payload.management_fee_pct {
        config.management_fee_pct = share(v);
    }
    if let Some(v) = payload.capex_amount {
        config.capex_amount = amount(v);
    }
    if let Some(v) = payload.capex_interval_years {
        config.capex_interval_years = v;
    }
    if let Some(v) = payload.sale_commission_pct {
        config.sale_commission_pct = share(v);
    }
    if let Some(v) = payload.sale_closing_cost_pct {
        config.sale_closing_cost_pct = share(v);
    }

    if let Some(v) = payload.rent_tax_mode {
        config.rent_tax_mode = v.into();
    }
    if let Some(v) = payload.blind_deduction_pct {
        config.blind_deduction_pct = share(v);
    }
    if let Some(v) = payload.rent_tax_rate_pct {
        config.rent_tax_rate_pct = share(v);
    }

    if let Some(v) = payload.monthly_rent_paid {
        config.monthly_rent_paid = amount(v);
    }
    if let Some(v) = payload.rent_paid_indexed_to_inflation {
        config.rent_paid_indexed_to_inflation = v;
    }
    if let Some(v) = payload.investment_rate_pct {
        config.investment_rate_pct = growth(v);
    }
    if let Some(v) = payload.top_up_invest {
        config.annual_top_up_invest = signed(v);
    }

    if let Some(v) = payload.interest_tax_rate_pct {
        config.interest_tax_rate_pct = share(v);
    }
    if let Some(v) = payload.tax_only_real_interest {
        config.tax_only_real_interest = v;
    }

    Ok(config)
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/defaults", get(defaults_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(AppState::default())
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "rentvest HTTP API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, Configuration::default())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn compare_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<ComparePayload>, QueryRejection>,
) -> Response {
    let payload = payload
        .map(|Query(payload)| payload)
        .map_err(|rejection| InputError::InvalidQuery(rejection.body_text()));
    compare_handler_impl(&state, payload)
}

async fn compare_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComparePayload>, JsonRejection>,
) -> Response {
    let payload = payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| InputError::InvalidJson(rejection.body_text()));
    compare_handler_impl(&state, payload)
}

fn compare_handler_impl(
    state: &AppState,
    payload: Result<ComparePayload, InputError>,
) -> Response {
    let config = match payload.and_then(config_from_payload) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "rejected compare request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let response = build_compare_response(state, config);
    info!(
        years = response.comparison.years,
        winner = ?response.comparison.summary.winner,
        difference = response.comparison.summary.difference,
        "comparison served"
    );
    json_response(StatusCode::OK, response)
}

fn build_compare_response(state: &AppState, config: Configuration) -> CompareResponse {
    let mut cache = state.cache();
    let comparison = cache.get_or_compute(&config, config.years);
    let checkpoints = CHECKPOINT_YEARS
        .iter()
        .copied()
        .chain(std::iter::once(config.years))
        .map(|years| Checkpoint::from(&*cache.get_or_compute(&config, years)))
        .collect();

    CompareResponse {
        comparison: (*comparison).clone(),
        configuration: config,
        checkpoints,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Strategy, checkpoint_report, compare};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn config_from_json(json: &str) -> Result<Configuration, InputError> {
        config_from_payload(payload_from_json(json)?)
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 4 * 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let config = config_from_json("{}").expect("defaults");
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn payload_parses_web_keys() {
        let json = r#"{
          "years": 20,
          "price": 3500000,
          "purchaseCostPct": 6,
          "inflationPct": 3.5,
          "realAppreciationPct": 0.5,
          "vacancyMonths": 1,
          "condoFee": 1500,
          "capexAmount": 80000,
          "capexIntervalYears": 7,
          "rentTaxMode": "real-expenses",
          "monthlyRentPaid": 12000,
          "rentPaidIndexedToInflation": false,
          "investmentRatePct": 7.25,
          "taxOnlyRealInterest": false
        }"#;
        let config = config_from_json(json).expect("json should parse");

        assert_eq!(config.years, 20);
        assert_approx(config.price, 3_500_000.0);
        assert_approx(config.purchase_cost_pct, 6.0);
        assert_approx(config.annual_inflation_pct, 3.5);
        assert_approx(config.real_appreciation_pct, 0.5);
        assert_approx(config.vacancy_months_per_year, 1.0);
        assert_approx(config.monthly_condo_fee, 1_500.0);
        assert_approx(config.capex_amount, 80_000.0);
        assert_eq!(config.capex_interval_years, 7);
        assert_eq!(config.rent_tax_mode, RentTaxMode::RealExpenses);
        assert_approx(config.monthly_rent_paid, 12_000.0);
        assert!(!config.rent_paid_indexed_to_inflation);
        assert_approx(config.investment_rate_pct, 7.25);
        assert!(!config.tax_only_real_interest);
    }

    #[test]
    fn rent_tax_mode_accepts_aliases() {
        let config = config_from_json(r#"{ "rentTaxMode": "blindDeduction" }"#).expect("alias");
        assert_eq!(config.rent_tax_mode, RentTaxMode::BlindDeduction);
        let config = config_from_json(r#"{ "rentTaxMode": "real" }"#).expect("alias");
        assert_eq!(config.rent_tax_mode, RentTaxMode::RealExpenses);
    }

    #[test]
    fn monthly_rent_selects_fixed_basis() {
        let config = config_from_json(r#"{ "monthlyRentReceived": 9000 }"#).expect("fixed");
        assert_eq!(
            config.rent_basis,
            RentBasis::Fixed {
                monthly_rent_received: 9_000.0,
                indexed_to_inflation: true,
            }
        );

        let config = config_from_json(
            r#"{ "monthlyRentReceived": 9000, "rentIndexedToInflation": false }"#,
        )
        .expect("fixed");
        assert_eq!(
            config.rent_basis,
            RentBasis::Fixed {
                monthly_rent_received: 9_000.0,
                indexed_to_inflation: false,
            }
        );
    }

    #[test]
    fn conflicting_rent_basis_is_rejected() {
        let err = config_from_json(r#"{ "rentalYieldPct": 4, "monthlyRentReceived": 9000 }"#)
            .expect_err("must reject both bases");
        assert_eq!(err, InputError::ConflictingRentBasis);

        let err = config_from_json(r#"{ "rentIndexedToInflation": true }"#)
            .expect_err("must reject indexing without fixed rent");
        assert_eq!(err, InputError::IndexingWithoutFixedRent);
    }

    #[test]
    fn horizon_outside_range_is_rejected() {
        let err = config_from_json(r#"{ "years": 0 }"#).expect_err("zero horizon");
        assert!(err.to_string().contains("years"));
        let err = config_from_json(r#"{ "years": 101 }"#).expect_err("long horizon");
        assert_eq!(
            err,
            InputError::HorizonOutOfRange {
                got: 101,
                max: MAX_HORIZON_YEARS
            }
        );
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = payload_from_json("{ not json").expect_err("must fail");
        assert!(matches!(err, InputError::InvalidJson(_)));
    }

    #[test]
    fn payload_values_are_normalised_to_their_field_ranges() {
        let config = config_from_json(
            r#"{ "vacancyMonths": 30, "maintenanceMonths": -2, "managementFeePct": 250,
                 "insurance": -500, "inflationPct": -400, "investmentRatePct": 150,
                 "topUpInvest": -1200 }"#,
        )
        .expect("valid");

        assert_approx(config.vacancy_months_per_year, 12.0);
        assert_approx(config.maintenance_months_per_year, 0.0);
        assert_approx(config.management_fee_pct, 100.0);
        assert_approx(config.annual_insurance, 0.0);
        assert_approx(config.annual_inflation_pct, -100.0);
        assert_approx(config.investment_rate_pct, 150.0);
        assert_approx(config.annual_top_up_invest, -1_200.0);
    }

    #[test]
    fn validate_horizon_accepts_only_one_to_max() {
        assert_eq!(validate_horizon(1), Ok(1));
        assert_eq!(validate_horizon(MAX_HORIZON_YEARS), Ok(MAX_HORIZON_YEARS));
        assert_eq!(
            validate_horizon(0),
            Err(InputError::HorizonOutOfRange {
                got: 0,
                max: MAX_HORIZON_YEARS
            })
        );
        assert!(validate_horizon(MAX_HORIZON_YEARS + 1).is_err());
    }

    #[test]
    fn normalize_number_zeroes_non_finite_and_clamps() {
        assert_eq!(normalize_number(f64::NAN, None, None), 0.0);
        assert_eq!(normalize_number(f64::INFINITY, Some(-5.0), None), 0.0);
        assert_eq!(normalize_number(-3.0, Some(0.0), Some(12.0)), 0.0);
        assert_eq!(normalize_number(30.0, Some(0.0), Some(12.0)), 12.0);
        assert_eq!(normalize_number(7.5, Some(0.0), Some(12.0)), 7.5);
    }

    #[test]
    fn compare_response_serializes_expected_keys() {
        let state = AppState::default();
        let response = build_compare_response(&state, Configuration::default());
        let json = serde_json::to_string(&response).expect("response should serialize");

        for key in [
            "\"configuration\"",
            "\"comparison\"",
            "\"checkpoints\"",
            "\"valueSeries\"",
            "\"flowSeries\"",
            "\"exitCost\"",
            "\"finalCapital\"",
            "\"winner\"",
        ] {
            assert!(json.contains(key), "missing {key}");
        }
    }

    #[test]
    fn compare_response_matches_direct_computation() {
        let state = AppState::default();
        let config = Configuration {
            years: 12,
            ..Configuration::default()
        };
        let response = build_compare_response(&state, config.clone());

        assert_eq!(response.comparison, compare(&config, 12));
        assert_eq!(response.checkpoints, checkpoint_report(&config));
        assert_eq!(state.cache().misses(), 3);
    }

    #[tokio::test]
    async fn get_compare_returns_summary() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/compare?years=5&price=1000000&investmentRatePct=0&monthlyRentPaid=0&rentalYieldPct=0&purchaseCostPct=0&saleCommissionPct=0&saleClosingCostPct=0&inflationPct=0&realAppreciationPct=0&propertyTaxPct=0")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let payload = body_json(response).await;
        let summary = &payload["comparison"]["summary"];
        assert_eq!(summary["winner"], "buy");
        assert_eq!(summary["difference"].as_f64(), Some(0.0));
        assert_eq!(
            payload["comparison"]["series"]["valueSeries"]
                .as_array()
                .map(Vec::len),
            Some(5)
        );
    }

    #[tokio::test]
    async fn post_compare_rejects_bad_horizon() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/compare")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{ "years": 0 }"#))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = body_json(response).await;
        assert!(
            payload["error"]
                .as_str()
                .is_some_and(|msg| msg.contains("years"))
        );
    }

    #[tokio::test]
    async fn post_compare_reports_malformed_json_as_error_body() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/compare")
                    .header("content-type", "application/json")
                    .body(Body::from("{ not json"))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let payload = body_json(response).await;
        assert!(
            payload["error"]
                .as_str()
                .is_some_and(|msg| msg.starts_with("invalid JSON payload"))
        );
    }

    #[tokio::test]
    async fn get_compare_reports_bad_query_as_error_body() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/compare?years=ten")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = body_json(response).await;
        assert!(
            payload["error"]
                .as_str()
                .is_some_and(|msg| msg.starts_with("invalid query string"))
        );
    }

    #[tokio::test]
    async fn defaults_endpoint_returns_configuration() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/defaults")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["years"], 10);
        assert_eq!(payload["rentBasis"]["kind"], "yield");
        assert_eq!(payload["rentTaxMode"], "blind-deduction");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn tie_in_api_favours_buy() {
        let config = config_from_json(
            r#"{ "price": 1000000, "purchaseCostPct": 0, "inflationPct": 0,
                 "realAppreciationPct": 0, "propertyTaxPct": 0, "rentalYieldPct": 0,
                 "saleCommissionPct": 0, "saleClosingCostPct": 0,
                 "investmentRatePct": 0, "monthlyRentPaid": 0, "years": 3 }"#,
        )
        .expect("valid");
        let comparison = compare(&config, config.years);
        assert_eq!(comparison.summary.winner, Strategy::Buy);
    }
}
