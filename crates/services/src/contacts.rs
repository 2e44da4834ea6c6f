use bson::doc;
use mongodb::Database;
use tracing::warn;

use fellowpet_db::models::{AppUser, Employee, PushContact, ServiceProfile};

use crate::dao::BaseDao;
use crate::dao::base::DaoResult;

/// Resolved delivery addresses for one dispatch. Empty collections mean the
/// corresponding channel is skipped, not failed.
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    pub push_tokens: Vec<String>,
    pub emails: Vec<String>,
    pub phone: Option<String>,
}

impl RecipientSet {
    pub fn is_empty(&self) -> bool {
        self.push_tokens.is_empty() && self.emails.is_empty() && self.phone.is_none()
    }
}

/// Looks up who should receive a notification about a given subject.
pub struct ContactResolver {
    services: BaseDao<ServiceProfile>,
    push_contacts: BaseDao<PushContact>,
    employees: BaseDao<Employee>,
    users: BaseDao<AppUser>,
}

impl ContactResolver {
    pub fn new(db: &Database) -> Self {
        Self {
            services: BaseDao::new(db, ServiceProfile::COLLECTION),
            push_contacts: BaseDao::new(db, PushContact::COLLECTION),
            employees: BaseDao::new(db, Employee::COLLECTION),
            users: BaseDao::new(db, AppUser::COLLECTION),
        }
    }

    /// All registered device tokens for a service, deduplicated. Covers the
    /// owner's devices and every employee device enrolled for push.
    pub async fn service_push_tokens(&self, service_id: &str) -> DaoResult<Vec<String>> {
        let contacts = self
            .push_contacts
            .find_many(doc! { "service_id": service_id }, None)
            .await?;

        let mut tokens: Vec<String> = contacts
            .into_iter()
            .filter_map(|c| c.fcm_token)
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        Ok(tokens)
    }

    /// Device tokens for a single employee of a service.
    pub async fn employee_push_tokens(
        &self,
        service_id: &str,
        employee_id: &str,
    ) -> DaoResult<Vec<String>> {
        let contacts = self
            .push_contacts
            .find_many(
                doc! { "service_id": service_id, "employee_id": employee_id },
                None,
            )
            .await?;

        let mut tokens: Vec<String> = contacts
            .into_iter()
            .filter_map(|c| c.fcm_token)
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        Ok(tokens)
    }

    /// The service's notification email. Falls back to the login email when
    /// no separate contact email has been verified.
    pub async fn service_email(&self, service_id: &str) -> DaoResult<Option<String>> {
        let Some(profile) = self
            .services
            .find_one(doc! { "service_id": service_id })
            .await?
        else {
            warn!(service_id, "Service profile not found while resolving email");
            return Ok(None);
        };

        let email = profile
            .owner_email
            .filter(|e| !e.is_empty())
            .or(profile.login_email.filter(|e| !e.is_empty()));
        Ok(email)
    }

    /// Full recipient set for service-side notifications. Token and email
    /// lookups run concurrently.
    pub async fn resolve_service(&self, service_id: &str) -> DaoResult<RecipientSet> {
        let (push_tokens, email) = tokio::try_join!(
            self.service_push_tokens(service_id),
            self.service_email(service_id),
        )?;
        Ok(RecipientSet {
            push_tokens,
            emails: email.into_iter().collect(),
            phone: None,
        })
    }

    /// Recipient set for one employee: their enrolled devices plus their
    /// email from the employee record.
    pub async fn resolve_employee(
        &self,
        service_id: &str,
        employee_id: &str,
    ) -> DaoResult<RecipientSet> {
        let (push_tokens, employee) = tokio::try_join!(
            self.employee_push_tokens(service_id, employee_id),
            self.employees
                .find_one(doc! { "service_id": service_id, "employee_id": employee_id }),
        )?;

        Ok(RecipientSet {
            push_tokens,
            emails: employee
                .and_then(|e| e.email)
                .into_iter()
                .filter(|e| !e.is_empty())
                .collect(),
            phone: None,
        })
    }

    pub async fn employee(
        &self,
        service_id: &str,
        employee_id: &str,
    ) -> DaoResult<Option<Employee>> {
        self.employees
            .find_one(doc! { "service_id": service_id, "employee_id": employee_id })
            .await
    }

    /// Recipient set for a single app user, by identity uid.
    pub async fn resolve_user(&self, uid: &str) -> DaoResult<RecipientSet> {
        let Some(user) = self.users.find_one(doc! { "uid": uid }).await? else {
            warn!(uid, "User not found while resolving contacts");
            return Ok(RecipientSet::default());
        };

        Ok(RecipientSet {
            push_tokens: user
                .fcm_token
                .into_iter()
                .filter(|t| !t.is_empty())
                .collect(),
            emails: user.email.into_iter().filter(|e| !e.is_empty()).collect(),
            phone: None,
        })
    }

    pub async fn service_profile(&self, service_id: &str) -> DaoResult<Option<ServiceProfile>> {
        self.services.find_one(doc! { "service_id": service_id }).await
    }
}
