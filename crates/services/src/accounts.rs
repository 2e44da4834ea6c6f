use std::sync::Arc;

use bson::doc;
use mongodb::Database;
use tracing::{info, warn};

use fellowpet_db::models::AppUser;

use crate::channels::EmailSender;
use crate::compose::Composer;
use crate::dao::BaseDao;
use crate::error::ServiceResult;
use crate::identity::AuthDirectory;

const LOCK_GRACE_HOURS: i64 = 72;

/// Lifecycle of locked accounts: the lock notice and the removal sweep.
pub struct AccountService {
    users: BaseDao<AppUser>,
    email: Arc<dyn EmailSender>,
    directory: Arc<dyn AuthDirectory>,
    composer: Composer,
}

/// Whether a lock taken at `locked_at_millis` has outlived the grace period
/// at `now_millis`.
pub fn lock_expired(locked_at_millis: i64, now_millis: i64) -> bool {
    now_millis - locked_at_millis > LOCK_GRACE_HOURS * 60 * 60 * 1000
}

impl AccountService {
    pub fn new(
        db: &Database,
        email: Arc<dyn EmailSender>,
        directory: Arc<dyn AuthDirectory>,
        composer: Composer,
    ) -> Self {
        Self {
            users: BaseDao::new(db, AppUser::COLLECTION),
            email,
            directory,
            composer,
        }
    }

    /// Handles the active→locked transition: stamps `locked_at` and sends the
    /// lock notice if the account has an email.
    pub async fn on_account_locked(&self, uid: &str) -> ServiceResult<()> {
        self.users
            .update_one(
                doc! { "uid": uid },
                doc! { "$set": { "locked_at": bson::DateTime::now() } },
            )
            .await?;

        let Some(user) = self.users.find_one(doc! { "uid": uid }).await? else {
            warn!(uid, "Locked account not found");
            return Ok(());
        };

        if let Some(email) = user.email.filter(|e| !e.is_empty()) {
            self.email
                .send(&email, &self.composer.account_locked())
                .await?;
            info!(uid, "Lock notice sent");
        }
        Ok(())
    }

    /// Removes every account that stayed locked past the grace period: one
    /// removal email (when an address is on file), the identity-directory
    /// delete, then the document. Younger locks are untouched. Returns the
    /// number of accounts removed.
    pub async fn cleanup_locked_accounts(&self) -> ServiceResult<u64> {
        let now = bson::DateTime::now().timestamp_millis();
        let locked = self
            .users
            .find_many(doc! { "account_status": "locked" }, None)
            .await?;

        let mut deleted = 0;
        for user in locked {
            let Some(locked_at) = user.locked_at else {
                continue;
            };
            if !lock_expired(locked_at.timestamp_millis(), now) {
                continue;
            }

            if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
                if let Err(e) = self.email.send(email, &self.composer.account_removed()).await {
                    warn!(uid = %user.uid, error = %e, "Removal email failed");
                }
            }

            if let Err(e) = self.directory.delete_user(&user.uid).await {
                warn!(uid = %user.uid, error = %e, "Identity delete failed");
            }
            self.users.delete_one(doc! { "uid": &user.uid }).await?;
            deleted += 1;
        }

        info!(deleted, "Locked-account cleanup complete");
        Ok(deleted)
    }
}
