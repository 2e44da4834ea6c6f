use std::sync::Arc;

use mongodb::Database;

use fellowpet_config::Settings;
use fellowpet_services::{
    AccountService, ChannelSet, ContactResolver, EmailChangeService, NotifyContext,
    PayoutService, VerificationService,
    channels::{CloudApiWhatsappSender, FcmPushSender, SmtpEmailSender},
    compose::Composer,
    identity::{AuthDirectory, IdentityClient},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub notify: Arc<NotifyContext>,
    pub verification: Arc<VerificationService>,
    pub email_change: Arc<EmailChangeService>,
    pub payouts: Arc<PayoutService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> anyhow::Result<Self> {
        let email = Arc::new(SmtpEmailSender::new(&settings.smtp)?);
        let channels = ChannelSet {
            push: Arc::new(FcmPushSender::new(settings.fcm.clone())),
            email,
            whatsapp: Arc::new(CloudApiWhatsappSender::new(settings.whatsapp.clone())),
        };
        let directory = Arc::new(IdentityClient::new(settings.identity.clone()));
        Ok(Self::with_components(db, settings, channels, directory))
    }

    /// Wires the state from the given channel set and identity directory;
    /// tests substitute recording stubs here.
    pub fn with_components(
        db: Database,
        settings: Settings,
        channels: ChannelSet,
        directory: Arc<dyn AuthDirectory>,
    ) -> Self {
        let composer = Composer::new(settings.branding.clone());
        let payouts = Arc::new(PayoutService::new(&settings.razorpay));
        let accounts = Arc::new(AccountService::new(
            &db,
            channels.email.clone(),
            directory.clone(),
            composer.clone(),
        ));
        let notify = Arc::new(NotifyContext {
            db: db.clone(),
            contacts: ContactResolver::new(&db),
            composer: composer.clone(),
            channels: channels.clone(),
            payouts: payouts.clone(),
            accounts: accounts.clone(),
        });
        let verification = Arc::new(VerificationService::new(
            &db,
            channels.email.clone(),
            composer.clone(),
        ));
        let email_change = Arc::new(EmailChangeService::new(
            &db,
            channels.email.clone(),
            directory,
            composer,
            settings.app.clone(),
        ));

        Self {
            db,
            settings,
            notify,
            verification,
            email_change,
            payouts,
            accounts,
        }
    }
}
