use fellowpet_config::Settings;
use mongodb::{Client, Database, options::ClientOptions};
use tracing::info;

use crate::indexes::ensure_indexes;

/// Connects to MongoDB, verifies the deployment with a ping, and bootstraps
/// the collection indexes. Pool bounds from settings win over any encoded in
/// the connection string.
pub async fn init(settings: &Settings) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&settings.database.url).await?;
    options.app_name = Some("fellowpet".to_string());
    options.max_pool_size = settings.database.max_pool_size.or(options.max_pool_size);
    options.min_pool_size = settings.database.min_pool_size.or(options.min_pool_size);

    let client = Client::with_options(options)?;
    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    let db = client.database(&settings.database.name);
    ensure_indexes(&db).await?;

    info!(db = %settings.database.name, "MongoDB ready");
    Ok(db)
}
