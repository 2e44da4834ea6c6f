use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use fellowpet_config::FcmSettings;

use super::{ChannelError, ChannelResult, PushMessage, PushSender};
use async_trait::async_trait;

/// Push delivery over the FCM HTTP endpoint. One request per device token;
/// a batch succeeds when at least one token is accepted.
pub struct FcmPushSender {
    client: Client,
    settings: FcmSettings,
}

impl FcmPushSender {
    pub fn new(settings: FcmSettings) -> Self {
        Self {
            client: super::http_client(),
            settings,
        }
    }

    async fn send_one(&self, token: &str, message: &PushMessage) -> ChannelResult<bool> {
        let payload = json!({
            "to": token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "data": message.data,
        });

        let response = self
            .client
            .post(&self.settings.endpoint)
            .header(
                "Authorization",
                format!("key={}", self.settings.server_key),
            )
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected(format!("FCM {status}: {body}")));
        }

        let result: FcmResponse = response.json().await?;
        Ok(result.success > 0)
    }
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    success: u32,
    #[serde(default)]
    failure: u32,
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> ChannelResult<usize> {
        if tokens.is_empty() {
            return Err(ChannelError::BadRecipient("no device tokens".into()));
        }

        let mut accepted = 0;
        for token in tokens {
            match self.send_one(token, message).await {
                Ok(true) => accepted += 1,
                Ok(false) => warn!(token = %truncate_token(token), "FCM rejected token"),
                Err(e) => warn!(token = %truncate_token(token), error = %e, "FCM send failed"),
            }
        }

        if accepted == 0 {
            return Err(ChannelError::Rejected(format!(
                "all {} tokens rejected",
                tokens.len()
            )));
        }
        Ok(accepted)
    }
}

fn truncate_token(token: &str) -> &str {
    match token.char_indices().nth(12) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
