use std::sync::Arc;

use bson::doc;
use mongodb::Database;
use rand::RngCore;
use tracing::info;

use fellowpet_config::AppSettings;
use fellowpet_db::models::{ChangeKind, EmailChangeRequest, Party, ServiceProfile};

use crate::channels::EmailSender;
use crate::compose::Composer;
use crate::dao::BaseDao;
use crate::dao::base::DaoError;
use crate::error::{ServiceError, ServiceResult};
use crate::identity::AuthDirectory;

const TOKEN_TTL_HOURS: i64 = 24;

/// Verification progress of the two parties to an email change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualConfirmation {
    pub old_verified: bool,
    pub new_verified: bool,
}

impl DualConfirmation {
    pub fn start() -> Self {
        Self {
            old_verified: false,
            new_verified: false,
        }
    }

    /// Marks one party verified. Re-confirming an already-verified party is
    /// legal and changes nothing.
    pub fn confirm(self, party: Party) -> Self {
        match party {
            Party::Old => Self {
                old_verified: true,
                ..self
            },
            Party::New => Self {
                new_verified: true,
                ..self
            },
        }
    }

    /// The change may commit only once both parties have verified.
    pub fn can_finalize(self) -> bool {
        self.old_verified && self.new_verified
    }
}

/// Dual-confirmation email changes for both the service contact address and
/// the account sign-in address.
pub struct EmailChangeService {
    requests: BaseDao<EmailChangeRequest>,
    services: BaseDao<ServiceProfile>,
    email: Arc<dyn EmailSender>,
    directory: Arc<dyn AuthDirectory>,
    composer: Composer,
    app: AppSettings,
}

fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl EmailChangeService {
    pub fn new(
        db: &Database,
        email: Arc<dyn EmailSender>,
        directory: Arc<dyn AuthDirectory>,
        composer: Composer,
        app: AppSettings,
    ) -> Self {
        Self {
            requests: BaseDao::new(db, EmailChangeRequest::COLLECTION),
            services: BaseDao::new(db, ServiceProfile::COLLECTION),
            email,
            directory,
            composer,
            app,
        }
    }

    fn confirm_link(&self, subject_key: &str, kind: ChangeKind, party: Party, token: &str) -> String {
        let kind = match kind {
            ChangeKind::ContactEmail => "contact",
            ChangeKind::LoginEmail => "login",
        };
        let party = match party {
            Party::Old => "old",
            Party::New => "new",
        };
        format!(
            "{}/api/email-change/confirm?subject={subject_key}&kind={kind}&type={party}&token={token}",
            self.app.base_url
        )
    }

    /// Resolves the current address the change starts from.
    async fn current_email(&self, subject_key: &str, kind: ChangeKind) -> ServiceResult<String> {
        match kind {
            ChangeKind::ContactEmail => {
                let profile = self
                    .services
                    .find_one(doc! { "service_id": subject_key })
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Service not found".into()))?;
                profile
                    .owner_email
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| {
                        ServiceError::FailedPrecondition(
                            "Service has no contact email on file.".into(),
                        )
                    })
            }
            ChangeKind::LoginEmail => self
                .directory
                .user_email(subject_key)
                .await?
                .ok_or_else(|| {
                    ServiceError::FailedPrecondition("Current user has no email address.".into())
                }),
        }
    }

    /// Starts a change: records the request with two fresh tokens and mails
    /// distinct confirmation links to the old and new addresses.
    pub async fn request_change(
        &self,
        subject_key: &str,
        kind: ChangeKind,
        new_email: &str,
    ) -> ServiceResult<()> {
        if subject_key.is_empty() {
            return Err(ServiceError::InvalidArgument("Missing subject.".into()));
        }
        if !new_email.contains('@') {
            return Err(ServiceError::InvalidArgument(
                "A valid new email is required.".into(),
            ));
        }

        let old_email = self.current_email(subject_key, kind).await?;
        if old_email == new_email {
            return Err(ServiceError::InvalidArgument(
                "New email cannot be the same as the old email.".into(),
            ));
        }
        if kind == ChangeKind::LoginEmail && self.directory.email_in_use(new_email).await? {
            return Err(ServiceError::AlreadyExists(
                "This email address is already in use by another account.".into(),
            ));
        }

        let old_token = generate_token();
        let new_token = generate_token();

        let kind_bson = bson::ser::to_bson(&kind).map_err(DaoError::BsonSer)?;
        self.requests
            .upsert_one(
                doc! { "subject_key": subject_key, "kind": &kind_bson },
                doc! { "$set": {
                    "old_email": &old_email,
                    "new_email": new_email,
                    "old_token": &old_token,
                    "new_token": &new_token,
                    "old_verified": false,
                    "new_verified": false,
                    "created_at": bson::DateTime::now(),
                }},
            )
            .await?;

        let old_link = self.confirm_link(subject_key, kind, Party::Old, &old_token);
        let new_link = self.confirm_link(subject_key, kind, Party::New, &new_token);

        self.email
            .send(&old_email, &self.composer.email_change_confirmation(true, &old_link))
            .await?;
        self.email
            .send(new_email, &self.composer.email_change_confirmation(false, &new_link))
            .await?;

        info!(subject_key, ?kind, "Email change requested");
        Ok(())
    }

    async fn load_live_request(
        &self,
        subject_key: &str,
        kind: ChangeKind,
    ) -> ServiceResult<EmailChangeRequest> {
        let kind_bson = bson::ser::to_bson(&kind).map_err(DaoError::BsonSer)?;
        let filter = doc! { "subject_key": subject_key, "kind": &kind_bson };

        let Some(request) = self.requests.find_one(filter.clone()).await? else {
            return Err(ServiceError::NotFound(
                "Change request not found or already completed.".into(),
            ));
        };

        let age_ms = bson::DateTime::now().timestamp_millis()
            - request.created_at.timestamp_millis();
        if age_ms > TOKEN_TTL_HOURS * 60 * 60 * 1000 {
            self.requests.delete_one(filter).await?;
            return Err(ServiceError::DeadlineExceeded(
                "This change request has expired. Please start again.".into(),
            ));
        }
        Ok(request)
    }

    /// Handles a clicked confirmation link. Returns the HTML page to render.
    pub async fn confirm_party(
        &self,
        subject_key: &str,
        kind: ChangeKind,
        party: Party,
        token: &str,
    ) -> ServiceResult<String> {
        let request = self.load_live_request(subject_key, kind).await?;

        let expected = match party {
            Party::Old => &request.old_token,
            Party::New => &request.new_token,
        };
        if token != expected {
            return Err(ServiceError::PermissionDenied(
                "Invalid or expired link.".into(),
            ));
        }

        let field = match party {
            Party::Old => "old_verified",
            Party::New => "new_verified",
        };
        let kind_bson = bson::ser::to_bson(&kind).map_err(DaoError::BsonSer)?;
        self.requests
            .update_one(
                doc! { "subject_key": subject_key, "kind": &kind_bson },
                doc! { "$set": { field: true } },
            )
            .await?;

        info!(subject_key, ?kind, ?party, "Email change party confirmed");
        Ok(self.composer.email_change_confirmed_page(party == Party::Old))
    }

    /// Commits the change once both parties have verified, then removes the
    /// request so a replay fails with not-found.
    pub async fn finalize(&self, subject_key: &str, kind: ChangeKind) -> ServiceResult<String> {
        let request = self.load_live_request(subject_key, kind).await?;

        let state = DualConfirmation {
            old_verified: request.old_verified,
            new_verified: request.new_verified,
        };
        if !state.can_finalize() {
            return Err(ServiceError::FailedPrecondition(
                "Both emails must be verified before finalizing.".into(),
            ));
        }

        match kind {
            ChangeKind::ContactEmail => {
                self.services
                    .update_one(
                        doc! { "service_id": subject_key },
                        doc! { "$set": {
                            "owner_email": &request.new_email,
                            "notification_email_verified": true,
                        }},
                    )
                    .await?;
            }
            ChangeKind::LoginEmail => {
                self.directory
                    .update_email(subject_key, &request.new_email)
                    .await?;
                // Every service owned by this account carries the login email.
                self.services
                    .update_many(
                        doc! { "shop_user_id": subject_key },
                        doc! { "$set": { "login_email": &request.new_email } },
                    )
                    .await?;
            }
        }

        let kind_bson = bson::ser::to_bson(&kind).map_err(DaoError::BsonSer)?;
        self.requests
            .delete_one(doc! { "subject_key": subject_key, "kind": &kind_bson })
            .await?;

        info!(subject_key, ?kind, new_email = %request.new_email, "Email change finalized");
        Ok(request.new_email)
    }
}
