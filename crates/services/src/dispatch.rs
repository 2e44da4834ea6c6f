use std::sync::Arc;

use mongodb::Database;
use tracing::{info, warn};

use fellowpet_db::models::{Channel, DispatchRecord, NotificationOutcome};

use crate::channels::{
    EmailMessage, EmailSender, PushMessage, PushSender, WaTemplate, WhatsappSender,
};
use crate::contacts::RecipientSet;
use crate::dao::BaseDao;
use crate::dao::base::DaoResult;
use crate::events::EventKind;

/// The three delivery channels behind trait objects so tests can substitute
/// recording stubs.
#[derive(Clone)]
pub struct ChannelSet {
    pub push: Arc<dyn PushSender>,
    pub email: Arc<dyn EmailSender>,
    pub whatsapp: Arc<dyn WhatsappSender>,
}

/// One dispatch request: whichever payloads apply for the event. A `None`
/// payload means the event has nothing to say on that channel.
#[derive(Default)]
pub struct Dispatch {
    pub push: Option<PushMessage>,
    pub email: Option<EmailMessage>,
    pub whatsapp: Option<WaTemplate>,
}

impl ChannelSet {
    /// Sends every applicable (payload, recipient) pair concurrently and
    /// returns one outcome per channel. Channel failures become `failed`
    /// outcomes; missing payloads or recipients become `skipped`. Never
    /// returns an error, so event handlers always settle.
    pub async fn dispatch(&self, recipients: &RecipientSet, dispatch: Dispatch) -> Vec<NotificationOutcome> {
        let push_fut = async {
            match &dispatch.push {
                None => NotificationOutcome::skipped(Channel::Push, "no payload"),
                Some(_) if recipients.push_tokens.is_empty() => {
                    NotificationOutcome::skipped(Channel::Push, "no device tokens")
                }
                Some(message) => match self.push.send(&recipients.push_tokens, message).await {
                    Ok(accepted) => {
                        info!(accepted, "Push sent");
                        NotificationOutcome::sent(Channel::Push)
                    }
                    Err(e) => {
                        warn!(error = %e, "Push send failed");
                        NotificationOutcome::failed(Channel::Push, e.to_string())
                    }
                },
            }
        };

        let email_fut = async {
            match &dispatch.email {
                None => NotificationOutcome::skipped(Channel::Email, "no payload"),
                Some(_) if recipients.emails.is_empty() => {
                    NotificationOutcome::skipped(Channel::Email, "no email on file")
                }
                Some(message) => {
                    let mut last_err = None;
                    let mut sent_any = false;
                    for to in &recipients.emails {
                        match self.email.send(to, message).await {
                            Ok(()) => sent_any = true,
                            Err(e) => {
                                warn!(error = %e, "Email send failed");
                                last_err = Some(e.to_string());
                            }
                        }
                    }
                    if sent_any {
                        NotificationOutcome::sent(Channel::Email)
                    } else {
                        NotificationOutcome::failed(
                            Channel::Email,
                            last_err.unwrap_or_else(|| "unknown".into()),
                        )
                    }
                }
            }
        };

        let wa_fut = async {
            match (&dispatch.whatsapp, &recipients.phone) {
                (None, _) => NotificationOutcome::skipped(Channel::Whatsapp, "no payload"),
                (Some(_), None) => {
                    NotificationOutcome::skipped(Channel::Whatsapp, "no phone number")
                }
                (Some(template), Some(phone)) => {
                    match self.whatsapp.send_template(phone, template).await {
                        Ok(()) => NotificationOutcome::sent(Channel::Whatsapp),
                        Err(e) => {
                            warn!(error = %e, "WhatsApp send failed");
                            NotificationOutcome::failed(Channel::Whatsapp, e.to_string())
                        }
                    }
                }
            }
        };

        let (push, email, whatsapp) = tokio::join!(push_fut, email_fut, wa_fut);
        vec![push, email, whatsapp]
    }
}

/// Persists the settled outcomes of one dispatch attempt.
pub async fn record_dispatch(
    db: &Database,
    kind: EventKind,
    subject: &str,
    outcomes: Vec<NotificationOutcome>,
) -> DaoResult<()> {
    let dao: BaseDao<DispatchRecord> = BaseDao::new(db, DispatchRecord::COLLECTION);
    dao.insert_one(&DispatchRecord {
        id: None,
        event_kind: kind.as_str().to_string(),
        subject: subject.to_string(),
        outcomes,
        completed_at: bson::DateTime::now(),
    })
    .await?;
    Ok(())
}
