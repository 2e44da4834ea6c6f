use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

use fellowpet_services::payouts::{
    BeneficiaryResponse, PayoutResponse, PayoutService, PayoutWebhookEvent,
};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub service_id: String,
    pub order_ref: String,
    pub fund_account_id: String,
    /// Amount in minor units (paise).
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub payment_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BeneficiaryRequest {
    pub service_id: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub account_number: String,
    pub ifsc: String,
}

// ---- POST /api/payouts/initiate -------------------------------------------

pub async fn initiate(
    State(state): State<AppState>,
    Json(body): Json<InitiateRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let result = state
        .payouts
        .initiate_payout(
            &state.db,
            &body.service_id,
            &body.order_ref,
            &body.fund_account_id,
            body.amount,
        )
        .await?;
    Ok(Json(result))
}

// ---- POST /api/payouts/webhook (no auth, raw body) -------------------------

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let sig_header = headers
        .get("x-razorpay-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing signature header".to_string()))?;

    PayoutService::verify_signature(&state.settings.razorpay.webhook_secret, &body, sig_header)?;

    let event: PayoutWebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid event payload: {e}")))?;

    state.payouts.handle_webhook_event(&state.db, &event).await?;
    Ok(StatusCode::OK)
}

// ---- POST /api/payouts/refund ---------------------------------------------

pub async fn refund(
    State(state): State<AppState>,
    Json(body): Json<RefundRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.payouts.refund(&body.payment_id).await?;
    Ok(Json(result))
}

// ---- POST /api/payouts/beneficiary ----------------------------------------

pub async fn beneficiary(
    State(state): State<AppState>,
    Json(body): Json<BeneficiaryRequest>,
) -> Result<Json<BeneficiaryResponse>, ApiError> {
    let result = state
        .payouts
        .create_beneficiary(
            &state.db,
            &body.service_id,
            &body.name,
            &body.email,
            &body.contact,
            &body.account_number,
            &body.ifsc,
        )
        .await?;
    Ok(Json(result))
}
