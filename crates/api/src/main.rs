use fellowpet_api::{build_router, jobs, state::AppState};
use fellowpet_config::Settings;
use fellowpet_db::init;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "fellowpet_api=debug,fellowpet_services=debug,fellowpet_db=debug,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!(
        "Starting FellowPet API on {}:{}",
        settings.app.host, settings.app.port
    );

    let db = init(&settings).await?;

    let app_state = AppState::new(db, settings.clone())?;

    // Background jobs: payout reconciliation and locked-account cleanup.
    let _scheduler = jobs::start(app_state.clone()).await?;

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
