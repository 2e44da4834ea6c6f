use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use fellowpet_config::WhatsappSettings;

use super::{ChannelError, ChannelResult, WhatsappSender};

/// A pre-approved message template plus its positional body parameters.
#[derive(Debug, Clone)]
pub struct WaTemplate {
    pub name: &'static str,
    pub language: &'static str,
    pub body_params: Vec<String>,
}

impl WaTemplate {
    pub fn new(name: &'static str, body_params: Vec<String>) -> Self {
        Self {
            name,
            language: "en",
            body_params,
        }
    }
}

/// Template sends through the WhatsApp Cloud API.
pub struct CloudApiWhatsappSender {
    client: Client,
    settings: WhatsappSettings,
}

impl CloudApiWhatsappSender {
    pub fn new(settings: WhatsappSettings) -> Self {
        Self {
            client: super::http_client(),
            settings,
        }
    }
}

#[async_trait]
impl WhatsappSender for CloudApiWhatsappSender {
    async fn send_template(&self, to_phone: &str, template: &WaTemplate) -> ChannelResult<()> {
        let to = normalize_phone(to_phone)
            .ok_or_else(|| ChannelError::BadRecipient(to_phone.to_string()))?;

        let parameters: Vec<_> = template
            .body_params
            .iter()
            .map(|p| json!({ "type": "text", "text": p }))
            .collect();

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": template.name,
                "language": { "code": template.language },
                "components": [{ "type": "body", "parameters": parameters }],
            },
        });

        let url = format!(
            "{}/{}/messages",
            self.settings.api_base, self.settings.phone_number_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.access_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected(format!(
                "WhatsApp {status}: {body}"
            )));
        }
        Ok(())
    }
}

/// Strips formatting and applies the default country code to bare 10-digit
/// numbers.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Some(format!("91{digits}")),
        11.. => Some(digits),
        _ => None,
    }
}
