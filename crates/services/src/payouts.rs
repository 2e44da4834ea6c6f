use bson::doc;
use mongodb::Database;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use fellowpet_config::RazorpaySettings;
use fellowpet_db::models::{CompletedOrder, PendingPayout, ServiceProfile, WebhookLog};

use crate::dao::BaseDao;

pub const STATUS_PROCESSED: &str = "processed";

// ---- DTO types -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    pub payout_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BeneficiaryResponse {
    pub contact_id: String,
    pub fund_account_id: String,
    pub bank_verified: bool,
    pub verified_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayoutWebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl PayoutWebhookEvent {
    pub fn payout_entity(&self) -> Option<(&str, &str)> {
        let entity = self.payload.get("payout")?.get("entity")?;
        Some((entity.get("id")?.as_str()?, entity.get("status")?.as_str()?))
    }
}

// ---- Error type ----------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("Missing parameters: {0}")]
    MissingParameters(String),
    #[error("Payout API error: {0}")]
    ApiError(String),
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Database error: {0}")]
    Dao(#[from] crate::dao::base::DaoError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ---- Service -------------------------------------------------------------

/// Provider payouts through a RazorpayX-style API: basic-auth'd REST calls,
/// status reconciliation, and HMAC-verified webhooks.
pub struct PayoutService {
    settings: RazorpaySettings,
    client: reqwest::Client,
}

impl PayoutService {
    pub fn new(settings: &RazorpaySettings) -> Self {
        Self {
            settings: settings.clone(),
            client: crate::channels::http_client(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, PayoutError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.settings.key_id, Some(&self.settings.key_secret))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let parsed: serde_json::Value = response.json().await?;
        if !status.is_success() {
            return Err(PayoutError::ApiError(parsed.to_string()));
        }
        Ok(parsed)
    }

    // ---- Initiation ------------------------------------------------------

    /// Creates a payout for a completed order. The resulting payout info is
    /// attached to the order document if it already exists; otherwise it is
    /// parked in `pending_payouts` until the order lands.
    pub async fn initiate_payout(
        &self,
        db: &Database,
        service_id: &str,
        order_ref: &str,
        fund_account_id: &str,
        amount_minor: u64,
    ) -> Result<PayoutResponse, PayoutError> {
        if service_id.is_empty() || order_ref.is_empty() || fund_account_id.is_empty() {
            return Err(PayoutError::MissingParameters(
                "service_id, order_ref and fund_account_id are required".into(),
            ));
        }

        let url = format!("{}/payouts", self.settings.api_base);
        let result = self
            .post_json(
                &url,
                &json!({
                    "account_number": self.settings.account_number,
                    "fund_account_id": fund_account_id,
                    "amount": amount_minor,
                    "currency": "INR",
                    "mode": "IMPS",
                    "purpose": "payout",
                    "queue_if_low_balance": true,
                    "narration": "Payout",
                    "reference_id": order_ref,
                }),
            )
            .await?;

        let payout_id = result["id"].as_str().unwrap_or_default().to_string();
        let status = result["status"]
            .as_str()
            .unwrap_or("processing")
            .to_string();

        let orders: BaseDao<CompletedOrder> = BaseDao::new(db, CompletedOrder::COLLECTION);
        let attached = orders
            .update_one(
                doc! { "service_id": service_id, "order_ref": order_ref },
                doc! { "$set": {
                    "payout.payout_id": &payout_id,
                    "payout.payout_status": &status,
                    "payout.payout_done": false,
                    "payout.created_at": bson::DateTime::now(),
                }},
            )
            .await?;

        if attached {
            info!(order_ref, payout_id, "Payout attached to completed order");
        } else {
            let pending: BaseDao<PendingPayout> = BaseDao::new(db, PendingPayout::COLLECTION);
            pending
                .upsert_one(
                    doc! { "order_ref": order_ref },
                    doc! { "$set": {
                        "service_id": service_id,
                        "payout_id": &payout_id,
                        "payout_status": &status,
                        "payout_done": false,
                        "created_at": bson::DateTime::now(),
                    }},
                )
                .await?;
            info!(order_ref, payout_id, "Payout parked in pending_payouts");
        }

        Ok(PayoutResponse {
            payout_id,
            status,
        })
    }

    /// Moves a parked payout onto its completed order once the order document
    /// exists, then removes the side record. Safe to call on every order
    /// write.
    pub async fn attach_pending_payout(
        &self,
        db: &Database,
        service_id: &str,
        order_ref: &str,
    ) -> Result<bool, PayoutError> {
        let pending: BaseDao<PendingPayout> = BaseDao::new(db, PendingPayout::COLLECTION);
        let Some(parked) = pending.find_one(doc! { "order_ref": order_ref }).await? else {
            return Ok(false);
        };

        let orders: BaseDao<CompletedOrder> = BaseDao::new(db, CompletedOrder::COLLECTION);
        orders
            .update_one(
                doc! { "service_id": service_id, "order_ref": order_ref },
                doc! { "$set": {
                    "payout.payout_id": &parked.payout_id,
                    "payout.payout_status": &parked.payout_status,
                    "payout.payout_done": parked.payout_done,
                    "payout.created_at": parked.created_at,
                }},
            )
            .await?;
        pending.delete_one(doc! { "order_ref": order_ref }).await?;

        info!(order_ref, "Pending payout attached to completed order");
        Ok(true)
    }

    // ---- Reconciliation --------------------------------------------------

    /// Polls the provider for every order whose payout has not converged yet.
    /// Individual failures are logged and skipped so one bad payout never
    /// stalls the sweep. Returns the number of orders updated.
    pub async fn reconcile(&self, db: &Database) -> Result<u64, PayoutError> {
        let orders: BaseDao<CompletedOrder> = BaseDao::new(db, CompletedOrder::COLLECTION);
        let open = orders
            .find_many(doc! { "payout.payout_done": false }, None)
            .await?;

        if open.is_empty() {
            info!("No pending payouts to reconcile");
            return Ok(0);
        }

        let mut updated = 0;
        for order in &open {
            let Some(payout_id) = order.payout.as_ref().map(|p| p.payout_id.as_str()) else {
                continue;
            };
            if payout_id.is_empty() {
                continue;
            }

            match self.fetch_payout_status(payout_id).await {
                Ok(status) => {
                    orders
                        .update_one(
                            doc! { "payout.payout_id": payout_id },
                            doc! { "$set": {
                                "payout.payout_status": &status,
                                "payout.payout_done": status == STATUS_PROCESSED,
                                "payout.updated_at": bson::DateTime::now(),
                            }},
                        )
                        .await?;
                    updated += 1;
                }
                Err(e) => {
                    warn!(payout_id, error = %e, "Failed to verify payout");
                }
            }
        }

        info!(checked = open.len(), updated, "Payout reconciliation complete");
        Ok(updated)
    }

    async fn fetch_payout_status(&self, payout_id: &str) -> Result<String, PayoutError> {
        let url = format!("{}/payouts/{payout_id}", self.settings.api_base);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.settings.key_id, Some(&self.settings.key_secret))
            .send()
            .await?;

        let status = response.status();
        let parsed: serde_json::Value = response.json().await?;
        if !status.is_success() {
            return Err(PayoutError::ApiError(parsed.to_string()));
        }
        Ok(parsed["status"].as_str().unwrap_or_default().to_string())
    }

    // ---- Webhook processing ----------------------------------------------

    /// Verify the webhook signature: HMAC-SHA256 over the raw body, hex
    /// encoded, compared against the signature header.
    pub fn verify_signature(
        webhook_secret: &str,
        payload: &[u8],
        sig_header: &str,
    ) -> Result<(), PayoutError> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| PayoutError::InvalidSignature)?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if expected == sig_header {
            Ok(())
        } else {
            Err(PayoutError::InvalidSignature)
        }
    }

    /// Handle a verified webhook event: log it, then converge every order
    /// carrying the payout id.
    pub async fn handle_webhook_event(
        &self,
        db: &Database,
        event: &PayoutWebhookEvent,
    ) -> Result<(), PayoutError> {
        let Some((payout_id, status)) = event.payout_entity() else {
            info!(event = %event.event, "Webhook carried no payout entity");
            return Ok(());
        };

        info!(event = %event.event, payout_id, status, "Payout webhook received");

        let logs: BaseDao<WebhookLog> = BaseDao::new(db, WebhookLog::COLLECTION);
        logs.insert_one(&WebhookLog {
            id: None,
            source: "razorpay".to_string(),
            event: event.event.clone(),
            payout_id: payout_id.to_string(),
            status: status.to_string(),
            received_at: bson::DateTime::now(),
        })
        .await?;

        let orders: BaseDao<CompletedOrder> = BaseDao::new(db, CompletedOrder::COLLECTION);
        let matched = orders
            .update_many(
                doc! { "payout.payout_id": payout_id },
                doc! { "$set": {
                    "payout.payout_status": status,
                    "payout.payout_done": status == STATUS_PROCESSED,
                    "payout.updated_at": bson::DateTime::now(),
                }},
            )
            .await?;

        if matched == 0 {
            warn!(payout_id, "No order matched webhook payout");
        }
        Ok(())
    }

    // ---- Refunds ---------------------------------------------------------

    pub async fn refund(&self, payment_id: &str) -> Result<serde_json::Value, PayoutError> {
        if payment_id.is_empty() {
            return Err(PayoutError::MissingParameters("payment_id is required".into()));
        }
        let url = format!("{}/payments/{payment_id}/refund", self.settings.api_base);
        self.post_json(&url, &json!({})).await
    }

    // ---- Beneficiary onboarding ------------------------------------------

    /// Creates the provider-side contact and fund account for a service and
    /// runs a penny-drop validation, recording the ids on the service
    /// profile.
    pub async fn create_beneficiary(
        &self,
        db: &Database,
        service_id: &str,
        name: &str,
        email: &str,
        contact: &str,
        account_number: &str,
        ifsc: &str,
    ) -> Result<BeneficiaryResponse, PayoutError> {
        if service_id.is_empty()
            || name.is_empty()
            || email.is_empty()
            || contact.is_empty()
            || account_number.is_empty()
            || ifsc.is_empty()
        {
            return Err(PayoutError::MissingParameters(
                "service_id, name, email, contact, account_number and ifsc are required".into(),
            ));
        }

        let contact_id = self.create_contact(service_id, name, email, contact).await?;
        let services: BaseDao<ServiceProfile> = BaseDao::new(db, ServiceProfile::COLLECTION);
        services
            .update_one(
                doc! { "service_id": service_id },
                doc! { "$set": { "payout_contact_id": &contact_id } },
            )
            .await?;

        let fund_account_id = self
            .create_fund_account(&contact_id, name, account_number, ifsc)
            .await?;

        let validation = self
            .validate_fund_account(&fund_account_id, name, account_number, ifsc)
            .await?;
        let bank_verified = validation["status"].as_str() == Some("completed");
        let verified_name = validation["recipient_name"]
            .as_str()
            .or_else(|| validation["entity"]["bank_account"]["name"].as_str())
            .map(str::to_string);

        services
            .update_one(
                doc! { "service_id": service_id },
                doc! { "$set": {
                    "payout_fund_account_id": &fund_account_id,
                    "bank_verified": bank_verified,
                    "verified_name": verified_name.as_deref().unwrap_or(name),
                }},
            )
            .await?;

        Ok(BeneficiaryResponse {
            contact_id,
            fund_account_id,
            bank_verified,
            verified_name,
        })
    }

    pub async fn create_contact(
        &self,
        reference_id: &str,
        name: &str,
        email: &str,
        contact: &str,
    ) -> Result<String, PayoutError> {
        let url = format!("{}/contacts", self.settings.api_base);
        let result = self
            .post_json(
                &url,
                &json!({
                    "name": name,
                    "email": email,
                    "contact": contact,
                    "type": "vendor",
                    "reference_id": reference_id,
                }),
            )
            .await?;
        Ok(result["id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn create_fund_account(
        &self,
        contact_id: &str,
        name: &str,
        account_number: &str,
        ifsc: &str,
    ) -> Result<String, PayoutError> {
        let url = format!("{}/fund_accounts", self.settings.api_base);
        let result = self
            .post_json(
                &url,
                &json!({
                    "contact_id": contact_id,
                    "account_type": "bank_account",
                    "bank_account": {
                        "name": name,
                        "ifsc": ifsc,
                        "account_number": account_number,
                    },
                }),
            )
            .await?;
        Ok(result["id"].as_str().unwrap_or_default().to_string())
    }

    /// Penny-drop validation of a fund account (1 INR).
    pub async fn validate_fund_account(
        &self,
        fund_account_id: &str,
        name: &str,
        account_number: &str,
        ifsc: &str,
    ) -> Result<serde_json::Value, PayoutError> {
        let url = format!("{}/fund_accounts/validations", self.settings.api_base);
        self.post_json(
            &url,
            &json!({
                "account_number": account_number,
                "ifsc": ifsc,
                "name": name,
                "fund_account": { "id": fund_account_id },
                "amount": 100,
                "currency": "INR",
            }),
        )
        .await
    }
}
