//! HTTP mapping for library errors
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use proposta_commission::CommissionError;
use proposta_core::CalcError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error("RULES/no active commission rule covers a {discount}% discount")]
    NoCommissionRule { discount: f64 },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Calc(err) => err.code(),
            ApiError::Commission(_) | ApiError::NoCommissionRule { .. } => "RULES",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string(), "code": self.code() });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}
