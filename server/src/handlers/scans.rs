use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::ScanRecord;
use crate::state::AppState;
use crate::store::{ScanLedger, ScanQuery};
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::validation::{MessageCategory, ScanRequest};

/// What the scanning front-end shows the operator. The precise rejection
/// reason is not part of it.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub valid: bool,
    pub category: MessageCategory,
    pub message: &'static str,
    pub scan: ScanRecord,
}

#[derive(Debug, Deserialize)]
pub struct ListScansParams {
    pub ticket_id: Option<String>,
    pub limit: Option<i64>,
}

/// `POST /api/v1/scans`
pub async fn verify_scan(
    State(state): State<AppState>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let outcome = state.validator.scan(&request).await?;
    let category = outcome.verdict.category();

    let response = ScanResponse {
        valid: outcome.valid,
        category,
        message: category.message(),
        scan: outcome.record,
    };

    Ok(success(response, "Scan recorded").into_response())
}

/// `GET /api/v1/scans`: ledger entries, newest first.
pub async fn list_scans(
    State(state): State<AppState>,
    params: Result<Query<ListScansParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let query = ScanQuery {
        ticket_id: params.ticket_id.filter(|id| !id.is_empty()),
        limit: params.limit,
    };

    let scans = state.validator.store().list(&query).await?;
    let message = format!("{} scan(s) found", scans.len());

    Ok(success(scans, message).into_response())
}
