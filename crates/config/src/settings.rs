use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub smtp: SmtpSettings,
    pub fcm: FcmSettings,
    pub whatsapp: WhatsappSettings,
    pub razorpay: RazorpaySettings,
    pub identity: IdentitySettings,
    pub branding: BrandingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build magic confirmation links.
    pub base_url: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Display name used in the From header.
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FcmSettings {
    pub endpoint: String,
    pub server_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WhatsappSettings {
    pub api_base: String,
    pub phone_number_id: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RazorpaySettings {
    pub api_base: String,
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    /// Virtual account the payouts are drawn from.
    pub account_number: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentitySettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrandingSettings {
    pub app_name: String,
    pub brand_color: String,
    pub logo_url: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("FELLOWPET"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 4000)?
            .set_default("app.base_url", "http://localhost:4000")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "fellowpet")?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 465)?
            .set_default("smtp.username", "")?
            .set_default("smtp.password", "")?
            .set_default("smtp.from_name", "MyFellowPet Notifications")?
            .set_default("fcm.endpoint", "https://fcm.googleapis.com/fcm/send")?
            .set_default("fcm.server_key", "")?
            .set_default("whatsapp.api_base", "https://graph.facebook.com/v23.0")?
            .set_default("whatsapp.phone_number_id", "")?
            .set_default("whatsapp.access_token", "")?
            .set_default("razorpay.api_base", "https://api.razorpay.com/v1")?
            .set_default("razorpay.key_id", "")?
            .set_default("razorpay.key_secret", "")?
            .set_default("razorpay.webhook_secret", "")?
            .set_default("razorpay.account_number", "")?
            .set_default("identity.base_url", "http://localhost:9099")?
            .set_default("identity.api_key", "")?
            .set_default("branding.app_name", "MyFellowPet")?
            .set_default("branding.brand_color", "#4C51BF")?
            .set_default("branding.logo_url", "https://static.myfellowpet.example/web_logo.png")?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
