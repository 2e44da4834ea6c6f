use std::sync::Arc;

use bson::doc;
use mongodb::Database;
use rand::Rng;
use tracing::info;

use fellowpet_db::models::{AppUser, Purpose, ServiceProfile, VerificationCode};

use crate::channels::EmailSender;
use crate::compose::Composer;
use crate::dao::BaseDao;
use crate::error::{ServiceError, ServiceResult};

/// Sends and checks the 6-digit one-time codes used for email ownership and
/// account re-verification.
pub struct VerificationService {
    codes: BaseDao<VerificationCode>,
    services: BaseDao<ServiceProfile>,
    users: BaseDao<AppUser>,
    email: Arc<dyn EmailSender>,
    composer: Composer,
}

pub fn generate_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

impl VerificationService {
    pub fn new(db: &Database, email: Arc<dyn EmailSender>, composer: Composer) -> Self {
        Self {
            codes: BaseDao::new(db, VerificationCode::COLLECTION),
            services: BaseDao::new(db, ServiceProfile::COLLECTION),
            users: BaseDao::new(db, AppUser::COLLECTION),
            email,
            composer,
        }
    }

    /// Generates a fresh code for (subject, purpose), replacing any prior
    /// one, and emails it to `destination`.
    pub async fn send_code(
        &self,
        subject_key: &str,
        purpose: Purpose,
        destination: &str,
    ) -> ServiceResult<()> {
        if subject_key.is_empty() || destination.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Missing subject or destination.".into(),
            ));
        }

        let code = generate_code();
        let now = bson::DateTime::now();
        let expires_at = bson::DateTime::from_millis(
            now.timestamp_millis() + purpose.window_minutes() * 60 * 1000,
        );

        self.codes
            .upsert_one(
                doc! { "subject_key": subject_key, "purpose": bson::ser::to_bson(&purpose)
                    .map_err(crate::dao::base::DaoError::BsonSer)? },
                doc! { "$set": {
                    "code": &code,
                    "destination": destination,
                    "created_at": now,
                    "expires_at": expires_at,
                }},
            )
            .await?;

        let message = match purpose {
            Purpose::NotificationEmail => self.composer.notification_email_otp(&code),
            Purpose::SignupEmail => self.composer.signup_otp(&code),
            Purpose::AccountUnlock => self.composer.unlock_otp(&code),
        };
        self.email.send(destination, &message).await?;

        info!(subject_key, ?purpose, "Verification code sent");
        Ok(())
    }

    /// Checks a submitted code. Success consumes the code and flips the
    /// purpose's verified state; expiry and wrong attempts also consume it, so
    /// every stored code allows exactly one check.
    pub async fn verify_code(
        &self,
        subject_key: &str,
        purpose: Purpose,
        submitted: &str,
    ) -> ServiceResult<()> {
        if subject_key.is_empty() || submitted.is_empty() {
            return Err(ServiceError::InvalidArgument("Missing subject or code.".into()));
        }

        let purpose_bson =
            bson::ser::to_bson(&purpose).map_err(crate::dao::base::DaoError::BsonSer)?;
        let filter = doc! { "subject_key": subject_key, "purpose": &purpose_bson };

        let Some(stored) = self.codes.find_one(filter.clone()).await? else {
            return Err(ServiceError::NotFound(
                "No verification request found. Please send a new code.".into(),
            ));
        };

        if stored.is_expired(bson::DateTime::now().timestamp_millis()) {
            self.codes.delete_one(filter).await?;
            return Err(ServiceError::DeadlineExceeded(
                "The verification code has expired.".into(),
            ));
        }

        if stored.code != submitted {
            self.codes.delete_one(filter).await?;
            return Err(ServiceError::InvalidArgument(
                "The code you entered is incorrect.".into(),
            ));
        }

        self.codes.delete_one(filter).await?;
        self.mark_verified(subject_key, purpose).await?;

        info!(subject_key, ?purpose, "Verification succeeded");
        Ok(())
    }

    async fn mark_verified(&self, subject_key: &str, purpose: Purpose) -> ServiceResult<()> {
        match purpose {
            Purpose::NotificationEmail => {
                self.services
                    .update_one(
                        doc! { "service_id": subject_key },
                        doc! { "$set": { "notification_email_verified": true } },
                    )
                    .await?;
            }
            Purpose::SignupEmail => {}
            Purpose::AccountUnlock => {
                self.users
                    .update_one(
                        doc! { "uid": subject_key },
                        doc! { "$set": {
                            "account_status": "active",
                            "last_login": bson::DateTime::now(),
                        }},
                    )
                    .await?;
            }
        }
        Ok(())
    }
}
