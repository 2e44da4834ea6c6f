use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::{Client, Database, options::ClientOptions};
use tokio::net::TcpListener;

use fellowpet_api::{build_router, state::AppState};
use fellowpet_config::Settings;
use fellowpet_db::indexes::ensure_indexes;
use fellowpet_services::ChannelSet;
use fellowpet_services::channels::{
    ChannelError, ChannelResult, EmailMessage, EmailSender, PushMessage, PushSender, WaTemplate,
    WhatsappSender,
};
use fellowpet_services::error::ServiceResult;
use fellowpet_services::identity::AuthDirectory;

/// Records every push attempt instead of talking to FCM.
#[derive(Default)]
pub struct RecordingPush {
    /// (tokens, title, body) per send.
    pub sent: Mutex<Vec<(Vec<String>, String, String)>>,
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> ChannelResult<usize> {
        self.sent
            .lock()
            .unwrap()
            .push((tokens.to_vec(), message.title.clone(), message.body.clone()));
        Ok(tokens.len())
    }
}

/// Records every email instead of talking to SMTP.
#[derive(Default)]
pub struct RecordingEmail {
    /// (to, subject) per send.
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingEmail {
    pub fn subjects_for(&self, to: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(addr, _)| addr == to)
            .map(|(_, subject)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, to: &str, message: &EmailMessage) -> ChannelResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), message.subject.clone()));
        Ok(())
    }
}

/// Records WhatsApp template sends; can be flipped into failure mode to
/// exercise the claim-release path.
#[derive(Default)]
pub struct RecordingWhatsapp {
    /// (phone, template name) per send.
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl WhatsappSender for RecordingWhatsapp {
    async fn send_template(&self, to_phone: &str, template: &WaTemplate) -> ChannelResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected("provider unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to_phone.to_string(), template.name.to_string()));
        Ok(())
    }
}

/// In-memory identity directory.
#[derive(Default)]
pub struct FakeDirectory {
    pub emails: Mutex<HashMap<String, String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl AuthDirectory for FakeDirectory {
    async fn user_email(&self, uid: &str) -> ServiceResult<Option<String>> {
        Ok(self.emails.lock().unwrap().get(uid).cloned())
    }

    async fn email_in_use(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.emails.lock().unwrap().values().any(|e| e == email))
    }

    async fn update_email(&self, uid: &str, email: &str) -> ServiceResult<()> {
        self.emails
            .lock()
            .unwrap()
            .insert(uid.to_string(), email.to_string());
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> ServiceResult<()> {
        self.emails.lock().unwrap().remove(uid);
        self.deleted.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

/// A running test application with its own MongoDB database and recording
/// delivery channels.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
    pub push: Arc<RecordingPush>,
    pub email: Arc<RecordingEmail>,
    pub whatsapp: Arc<RecordingWhatsapp>,
    pub directory: Arc<FakeDirectory>,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017. Set
    /// FELLOWPET__DATABASE__URL to override the connection string. Each test
    /// gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        let db_name = format!("fellowpet_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = test_settings();
        if let Ok(url) = std::env::var("FELLOWPET__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let push = Arc::new(RecordingPush::default());
        let email = Arc::new(RecordingEmail::default());
        let whatsapp = Arc::new(RecordingWhatsapp::default());
        let directory = Arc::new(FakeDirectory::default());

        let channels = ChannelSet {
            push: push.clone(),
            email: email.clone(),
            whatsapp: whatsapp.clone(),
        };
        let app_state = AppState::with_components(
            db.clone(),
            settings.clone(),
            channels,
            directory.clone(),
        );
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::new();

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
            push,
            email,
            whatsapp,
            directory,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts a batch of change envelopes to the ingestion endpoint.
    pub async fn post_events(&self, events: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/events"))
            .json(&serde_json::json!({ "events": events }))
            .send()
            .await
            .expect("event ingestion request failed")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: fellowpet_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://localhost:4000".to_string(),
            cors_origins: vec![],
        },
        database: fellowpet_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "fellowpet_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        smtp: fellowpet_config::SmtpSettings {
            host: "localhost".to_string(),
            port: 465,
            username: "notifications@test.local".to_string(),
            password: String::new(),
            from_name: "FellowPet Test".to_string(),
        },
        fcm: fellowpet_config::FcmSettings {
            endpoint: "http://localhost:5002/fcm/send".to_string(),
            server_key: "test-fcm-key".to_string(),
        },
        whatsapp: fellowpet_config::WhatsappSettings {
            api_base: "http://localhost:5003".to_string(),
            phone_number_id: "12345".to_string(),
            access_token: "test-wa-token".to_string(),
        },
        razorpay: fellowpet_config::RazorpaySettings {
            api_base: "http://localhost:5004/v1".to_string(),
            key_id: "rzp_test_key".to_string(),
            key_secret: "rzp_test_secret".to_string(),
            webhook_secret: "whsec_test".to_string(),
            account_number: "2323230012345678".to_string(),
        },
        identity: fellowpet_config::IdentitySettings {
            base_url: "http://localhost:9099".to_string(),
            api_key: "test-identity-key".to_string(),
        },
        branding: fellowpet_config::BrandingSettings {
            app_name: "MyFellowPet".to_string(),
            brand_color: "#4C51BF".to_string(),
            logo_url: "https://static.test/logo.png".to_string(),
        },
    }
}
