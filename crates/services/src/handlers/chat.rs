use bson::doc;
use tracing::info;

use fellowpet_db::models::{
    Booking, Chat, ChatMessage, ChatNotificationSent, ChatParty, OutcomeStatus,
};

use crate::compose::FALLBACK_USER;
use crate::contacts::RecipientSet;
use crate::dao::BaseDao;
use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;
use crate::guard::should_notify_chat;

use super::NotifyContext;

/// Chat messages from users alert the provider at most once per unread
/// stretch; see [`should_notify_chat`] for the skip rules.
pub async fn on_message(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let chat_id = env
        .chat_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ServiceError::InvalidArgument(format!("{} event missing chat_id", env.kind.as_str()))
        })?;
    let message_id = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;

    let messages: BaseDao<ChatMessage> = BaseDao::new(&ctx.db, ChatMessage::COLLECTION);
    let message = messages
        .find_one(doc! { "chat_id": chat_id, "message_id": message_id })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("message {message_id} not found")))?;

    if message.sent_by != ChatParty::User {
        return Ok(());
    }

    let (service_id, booking_ref) = chat_id.split_once('_').ok_or_else(|| {
        ServiceError::InvalidArgument(format!("malformed chat id {chat_id}"))
    })?;

    let previous = messages
        .find_many(
            doc! { "chat_id": chat_id, "timestamp": { "$lt": message.timestamp } },
            Some(doc! { "timestamp": -1 }),
        )
        .await?
        .into_iter()
        .next();
    let previous_sender_was_sp = previous.is_some_and(|m| m.sent_by == ChatParty::Sp);

    let chats: BaseDao<Chat> = BaseDao::new(&ctx.db, Chat::COLLECTION);
    let last_read_by_sp = chats
        .find_one(doc! { "chat_id": chat_id })
        .await?
        .and_then(|c| c.last_read_by_sp)
        .map(|d| d.timestamp_millis());

    let sent_log: BaseDao<ChatNotificationSent> =
        BaseDao::new(&ctx.db, ChatNotificationSent::COLLECTION);
    let last_notified_ts = sent_log
        .find_many(doc! { "chat_id": chat_id }, Some(doc! { "timestamp": -1 }))
        .await?
        .first()
        .map(|n| n.timestamp.timestamp_millis());

    if !should_notify_chat(
        message.timestamp.timestamp_millis(),
        last_read_by_sp,
        last_notified_ts,
        previous_sender_was_sp,
    ) {
        info!(chat_id, "Chat notification suppressed");
        return Ok(());
    }

    let bookings: BaseDao<Booking> = BaseDao::new(&ctx.db, Booking::COLLECTION);
    let user_name = bookings
        .find_one(doc! { "service_id": service_id, "booking_ref": booking_ref })
        .await?
        .and_then(|b| b.user_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_USER.to_string());

    let push = ctx.composer.chat_message(&user_name, booking_ref);
    let recipients = RecipientSet {
        push_tokens: ctx.contacts.service_push_tokens(service_id).await?,
        ..Default::default()
    };
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                ..Default::default()
            },
        )
        .await;

    // The unread-stretch dedup keys off this record, so it is written only
    // when the push actually went out.
    if outcomes[0].status == OutcomeStatus::Sent {
        sent_log
            .insert_one(&ChatNotificationSent {
                id: None,
                chat_id: chat_id.to_string(),
                message_id: message_id.to_string(),
                timestamp: message.timestamp,
            })
            .await?;
    }
    record_dispatch(&ctx.db, env.kind, chat_id, outcomes).await?;
    Ok(())
}
