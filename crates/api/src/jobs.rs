use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::state::AppState;

/// Registers and starts the in-process cron jobs: payout reconciliation
/// every 30 minutes and the locked-account cleanup sweep hourly.
pub async fn start(state: AppState) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let reconcile_state = state.clone();
    scheduler
        .add(Job::new_async("0 */30 * * * *", move |_uuid, _lock| {
            let state = reconcile_state.clone();
            Box::pin(async move {
                match state.payouts.reconcile(&state.db).await {
                    Ok(updated) => info!(updated, "Payout reconciliation run finished"),
                    Err(e) => warn!(error = %e, "Payout reconciliation run failed"),
                }
            })
        })?)
        .await?;

    let cleanup_state = state.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _lock| {
            let state = cleanup_state.clone();
            Box::pin(async move {
                match state.accounts.cleanup_locked_accounts().await {
                    Ok(deleted) => info!(deleted, "Locked-account cleanup run finished"),
                    Err(e) => warn!(error = %e, "Locked-account cleanup run failed"),
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    info!("Cron scheduler started");
    Ok(scheduler)
}
