use std::time::Duration;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::logger::{TraceId, child_span, request_span};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error};

use crate::error::AppError;
use crate::http::AppState;
use crate::logger::{annotate_span, warn_if_slow};
use crate::order::model::WaitEstimate;

#[derive(Debug, Deserialize)]
pub struct WaitTimeQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
struct ApiFailure {
    success: bool,
    error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
struct ApiErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            AppError::OrderNotFound => self.to_string(),
            // storage details stay in the logs
            AppError::Storage(_) => "internal error".to_string(),
        };

        let body = ApiFailure {
            success: false,
            error: ApiErrorDetail {
                code: self.code(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// `GET /public/orders/{order_number}/wait-time?token=...`
///
/// Unknown orders and bad tokens both answer 404 `ORDER_NOT_FOUND`. A query
/// string that does not parse counts as a missing token.
pub async fn wait_time(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    query: Result<Query<WaitTimeQuery>, QueryRejection>,
) -> Result<Json<ApiSuccess<WaitEstimate>>, AppError> {
    let trace_id = TraceId::default();
    let span = request_span("wait_time", &trace_id);

    async move {
        annotate_span(&order_number, None);

        let query = match query {
            Ok(Query(q)) => q,
            Err(rejection) => {
                debug!(error = %rejection, "malformed query string");
                WaitTimeQuery { token: None }
            }
        };

        let found = warn_if_slow(
            "db_fetch_order_and_merchant",
            Duration::from_millis(100),
            state.repo.fetch_order_and_merchant(&order_number),
        )
        .await
        .map_err(|e| {
            error!(error = ?e, "order lookup failed");
            AppError::Storage(e.context("order lookup failed"))
        })?;

        let Some((order, merchant)) = found else {
            debug!("order does not exist");
            return Err(AppError::OrderNotFound);
        };

        let token = query.token.as_deref().unwrap_or_default();
        if !state
            .tokens
            .verify(token, &merchant.merchant_code, &order.order_number)
        {
            debug!("order token rejected");
            return Err(AppError::OrderNotFound);
        }

        annotate_span(&order.order_number, Some(&merchant.merchant_id));

        let estimate = state
            .estimator
            .estimate(&order, &merchant)
            .instrument(child_span("estimate"))
            .await;

        Ok(Json(ApiSuccess {
            success: true,
            data: estimate,
        }))
    }
    .instrument(span)
    .await
}
