pub mod account;
pub mod booking;
pub mod chat;
pub mod edit_request;
pub mod employee;
pub mod service;
pub mod task;
pub mod whatsapp;

use std::sync::Arc;

use mongodb::Database;
use tracing::{info, warn};

use crate::accounts::AccountService;
use crate::compose::Composer;
use crate::contacts::ContactResolver;
use crate::dispatch::ChannelSet;
use crate::error::ServiceResult;
use crate::events::{ChangeEnvelope, EventKind};
use crate::payouts::PayoutService;

/// Everything an event handler needs, wired once at startup.
pub struct NotifyContext {
    pub db: Database,
    pub contacts: ContactResolver,
    pub composer: Composer,
    pub channels: ChannelSet,
    pub payouts: Arc<PayoutService>,
    pub accounts: Arc<AccountService>,
}

/// Result reported back per ingested event.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Handled,
    Rejected,
}

/// Routes one change envelope to its handler. Handler failures are logged
/// and reported per event; they never abort the batch.
pub async fn handle_event(ctx: &NotifyContext, envelope: &ChangeEnvelope) -> EventStatus {
    let result: ServiceResult<()> = match envelope.kind {
        EventKind::BookingCreated => booking::on_created(ctx, envelope).await,
        EventKind::BookingUpdated => booking::on_updated(ctx, envelope).await,
        EventKind::TaskCreated => task::on_created(ctx, envelope).await,
        EventKind::TaskSubmissionCreated => task::on_submitted(ctx, envelope).await,
        EventKind::EmployeeCreated => employee::on_created(ctx, envelope).await,
        EventKind::ServiceUpdated => service::on_updated(ctx, envelope).await,
        EventKind::EditRequestUpdated => edit_request::on_updated(ctx, envelope).await,
        EventKind::ChatMessageCreated => chat::on_message(ctx, envelope).await,
        EventKind::OrderCompleted | EventKind::OrderUpdated => {
            whatsapp::on_order_written(ctx, envelope).await
        }
        EventKind::UserUpdated => account::on_updated(ctx, envelope).await,
    };

    match result {
        Ok(()) => {
            info!(kind = envelope.kind.as_str(), "Event handled");
            EventStatus::Handled
        }
        Err(e) => {
            warn!(kind = envelope.kind.as_str(), error = %e, "Event rejected");
            EventStatus::Rejected
        }
    }
}
