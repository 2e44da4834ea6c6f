pub mod email;
pub mod push;
pub mod whatsapp;

use async_trait::async_trait;
use thiserror::Error;

pub use email::SmtpEmailSender;
pub use push::FcmPushSender;
pub use whatsapp::{CloudApiWhatsappSender, WaTemplate};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Rejected by provider: {0}")]
    Rejected(String),
    #[error("Bad recipient: {0}")]
    BadRecipient(String),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Outbound HTTP client with the standard 30 s overall timeout.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// Opaque data payload for client-side routing.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Sends one push message to a batch of device tokens. Returns the count
    /// of tokens the provider accepted.
    async fn send(&self, tokens: &[String], message: &PushMessage) -> ChannelResult<usize>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, message: &EmailMessage) -> ChannelResult<()>;
}

#[async_trait]
pub trait WhatsappSender: Send + Sync {
    async fn send_template(&self, to_phone: &str, template: &WaTemplate) -> ChannelResult<()>;
}
