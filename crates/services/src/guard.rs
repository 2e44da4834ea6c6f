use bson::{Document, doc};
use mongodb::Database;

use crate::dao::base::DaoResult;

/// Edge detection over a boolean field across a document change. Handlers
/// fire on the edge, not the level, so redundant writes of the same value
/// never produce duplicate notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// false (or absent) before, true after.
    Rising,
    /// true before, false (or absent) after.
    Falling,
}

impl Transition {
    pub fn fired(&self, before: Option<bool>, after: Option<bool>) -> bool {
        let before = before.unwrap_or(false);
        let after = after.unwrap_or(false);
        match self {
            Self::Rising => !before && after,
            Self::Falling => before && !after,
        }
    }
}

/// Detects a string field moving into a target value.
pub fn entered_state(before: Option<&str>, after: Option<&str>, target: &str) -> bool {
    after == Some(target) && before != Some(target)
}

/// Whether a service-side chat notification should go out for the message at
/// `message_ts`.
///
/// Skipped when the previous message came from the provider (they are active
/// in the chat), when the provider has already read this message or a newer
/// one, or when a notification already went out since the provider's last
/// read (one alert per unread stretch).
pub fn should_notify_chat(
    message_ts: i64,
    last_read_by_sp: Option<i64>,
    last_notified_ts: Option<i64>,
    previous_sender_was_sp: bool,
) -> bool {
    if previous_sender_was_sp {
        return false;
    }
    if last_read_by_sp.is_some_and(|read| read >= message_ts) {
        return false;
    }
    if last_notified_ts.is_some_and(|sent| sent > last_read_by_sp.unwrap_or(0)) {
        return false;
    }
    true
}

/// Claim state for a once-only external send tracked on the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendClaim {
    /// This caller won the claim and must perform the send.
    Claimed,
    /// Another caller already sent or is sending.
    AlreadyHandled,
}

/// Atomic claim over a `{sent, in_progress}` flag pair embedded at
/// `field_path` in a document. The claim is a single find-and-update so two
/// concurrent deliveries of the same event race on the database, not in
/// process memory.
pub struct SentFlagGuard<'a> {
    db: &'a Database,
    collection: &'a str,
    field_path: &'a str,
}

impl<'a> SentFlagGuard<'a> {
    pub fn new(db: &'a Database, collection: &'a str, field_path: &'a str) -> Self {
        Self {
            db,
            collection,
            field_path,
        }
    }

    /// Attempts to claim the send. Matches only documents where neither
    /// `sent` nor `in_progress` is set, flipping `in_progress` in the same
    /// operation.
    pub async fn try_begin(&self, filter: Document) -> DaoResult<SendClaim> {
        let sent_path = format!("{}.sent", self.field_path);
        let progress_path = format!("{}.in_progress", self.field_path);

        let mut claim_filter = filter;
        claim_filter.insert(&sent_path, doc! { "$ne": true });
        claim_filter.insert(&progress_path, doc! { "$ne": true });

        let claimed = self
            .db
            .collection::<Document>(self.collection)
            .find_one_and_update(
                claim_filter,
                doc! { "$set": {
                    &progress_path: true,
                    format!("{}.last_attempt_at", self.field_path): bson::DateTime::now(),
                }},
            )
            .await?;

        Ok(if claimed.is_some() {
            SendClaim::Claimed
        } else {
            SendClaim::AlreadyHandled
        })
    }

    /// Marks the claimed send as done.
    pub async fn complete_ok(&self, filter: Document) -> DaoResult<()> {
        self.db
            .collection::<Document>(self.collection)
            .update_one(
                filter,
                doc! { "$set": {
                    format!("{}.sent", self.field_path): true,
                    format!("{}.in_progress", self.field_path): false,
                    format!("{}.sent_at", self.field_path): bson::DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    /// Releases the claim after a failed send so a later delivery may retry.
    pub async fn complete_failed(&self, filter: Document, reason: &str) -> DaoResult<()> {
        self.db
            .collection::<Document>(self.collection)
            .update_one(
                filter,
                doc! { "$set": {
                    format!("{}.in_progress", self.field_path): false,
                    format!("{}.failed", self.field_path): true,
                    format!("{}.failure_reason", self.field_path): reason,
                }},
            )
            .await?;
        Ok(())
    }
}
