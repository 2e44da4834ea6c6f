use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use fellowpet_db::models::Purpose;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub subject_key: String,
    pub purpose: Purpose,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub subject_key: String,
    pub purpose: Purpose,
    pub code: String,
}

// ---- POST /api/verification/send -----------------------------------------

pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .verification
        .send_code(&body.subject_key, body.purpose, &body.destination)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- POST /api/verification/verify ----------------------------------------

pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .verification
        .verify_code(&body.subject_key, body.purpose, &body.code)
        .await?;
    Ok(Json(serde_json::json!({ "verified": true })))
}
