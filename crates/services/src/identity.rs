use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use fellowpet_config::IdentitySettings;

use crate::error::{ServiceError, ServiceResult};

/// Operations against the external identity directory. Behind a trait so
/// workflows can be exercised with an in-memory fake.
#[async_trait]
pub trait AuthDirectory: Send + Sync {
    /// The email currently registered for `uid`, if any.
    async fn user_email(&self, uid: &str) -> ServiceResult<Option<String>>;
    /// Whether some other account already owns `email`.
    async fn email_in_use(&self, email: &str) -> ServiceResult<bool>;
    /// Rebinds the account's sign-in email.
    async fn update_email(&self, uid: &str, email: &str) -> ServiceResult<()>;
    /// Removes the account entirely.
    async fn delete_user(&self, uid: &str) -> ServiceResult<()>;
}

/// HTTP client for the identity provider's admin API.
pub struct IdentityClient {
    client: Client,
    settings: IdentitySettings,
}

impl IdentityClient {
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            client: crate::channels::http_client(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}?key={}", self.settings.base_url, self.settings.api_key)
    }
}

#[async_trait]
impl AuthDirectory for IdentityClient {
    async fn user_email(&self, uid: &str) -> ServiceResult<Option<String>> {
        let response = self
            .client
            .post(self.url("/v1/accounts:lookup"))
            .json(&json!({ "localId": [uid] }))
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "identity lookup failed: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        Ok(body["users"][0]["email"].as_str().map(str::to_string))
    }

    async fn email_in_use(&self, email: &str) -> ServiceResult<bool> {
        let response = self
            .client
            .post(self.url("/v1/accounts:lookup"))
            .json(&json!({ "email": [email] }))
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "identity lookup failed: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        Ok(body["users"].as_array().is_some_and(|u| !u.is_empty()))
    }

    async fn update_email(&self, uid: &str, email: &str) -> ServiceResult<()> {
        let response = self
            .client
            .post(self.url("/v1/accounts:update"))
            .json(&json!({ "localId": uid, "email": email }))
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "identity update failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> ServiceResult<()> {
        let response = self
            .client
            .post(self.url("/v1/accounts:delete"))
            .json(&json!({ "localId": uid }))
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "identity delete failed: {}",
                response.status()
            )));
        }
        Ok(())
    }
}
