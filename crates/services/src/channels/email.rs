use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};

use fellowpet_config::SmtpSettings;

use super::{ChannelError, ChannelResult, EmailMessage, EmailSender};

/// HTML email over SMTP. The transport holds a connection pool, so one
/// instance is shared across all handlers.
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailSender {
    pub fn new(settings: &SmtpSettings) -> ChannelResult<Self> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| ChannelError::Smtp(format!("invalid SMTP host: {e}")))?
            .port(settings.port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from: format!("{} <{}>", settings.from_name, settings.username),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, message: &EmailMessage) -> ChannelResult<()> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ChannelError::Smtp(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| ChannelError::BadRecipient(format!("{to}: {e}")))?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| ChannelError::Smtp(format!("failed to build message: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ChannelError::Smtp(e.to_string()))?;
        Ok(())
    }
}
