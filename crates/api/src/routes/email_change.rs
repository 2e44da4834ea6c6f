use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;

use fellowpet_db::models::{ChangeKind, Party};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub subject_key: String,
    pub kind: String,
    pub new_email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub subject: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub party: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub subject_key: String,
    pub kind: String,
}

fn parse_kind(kind: &str) -> Result<ChangeKind, ApiError> {
    match kind {
        "contact" => Ok(ChangeKind::ContactEmail),
        "login" => Ok(ChangeKind::LoginEmail),
        other => Err(ApiError::BadRequest(format!(
            "Unknown change kind: {other}"
        ))),
    }
}

fn parse_party(party: &str) -> Result<Party, ApiError> {
    match party {
        "old" => Ok(Party::Old),
        "new" => Ok(Party::New),
        other => Err(ApiError::BadRequest(format!("Unknown party: {other}"))),
    }
}

// ---- POST /api/email-change/request ---------------------------------------

pub async fn request(
    State(state): State<AppState>,
    Json(body): Json<ChangeRequest>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&body.kind)?;
    state
        .email_change
        .request_change(&body.subject_key, kind, &body.new_email)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- GET /api/email-change/confirm (magic link) ----------------------------

pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Html<String>, ApiError> {
    let kind = parse_kind(&query.kind)?;
    let party = parse_party(&query.party)?;
    let page = state
        .email_change
        .confirm_party(&query.subject, kind, party, &query.token)
        .await?;
    Ok(Html(page))
}

// ---- POST /api/email-change/finalize ---------------------------------------

pub async fn finalize(
    State(state): State<AppState>,
    Json(body): Json<FinalizeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind = parse_kind(&body.kind)?;
    let new_email = state
        .email_change
        .finalize(&body.subject_key, kind)
        .await?;
    Ok(Json(serde_json::json!({ "new_email": new_email })))
}
