use bson::{Document, doc};
use tracing::{info, warn};

use fellowpet_db::models::{Booking, Channel, CompletedOrder, NotificationOutcome};

use crate::channels::WaTemplate;
use crate::compose::{
    Composer, FALLBACK_PARTNER, FALLBACK_PET_PARENT, format_dm_dates,
};
use crate::dao::BaseDao;
use crate::dispatch::record_dispatch;
use crate::error::{ServiceError, ServiceResult};
use crate::events::{ChangeEnvelope, EventKind};
use crate::guard::{SendClaim, SentFlagGuard};

use super::NotifyContext;

/// Performs one claim-guarded WhatsApp template send. The claim is taken on
/// the document itself, so a redelivered event or a concurrent worker finds
/// it already held and stays quiet. Channel failures release the claim and
/// are recorded, never propagated.
async fn guarded_send(
    ctx: &NotifyContext,
    collection: &str,
    field_path: &str,
    filter: Document,
    phone: Option<&str>,
    template: WaTemplate,
    kind: EventKind,
    subject: &str,
) -> ServiceResult<()> {
    let Some(phone) = phone.filter(|p| !p.is_empty()) else {
        record_dispatch(
            &ctx.db,
            kind,
            subject,
            vec![NotificationOutcome::skipped(
                Channel::Whatsapp,
                "no phone number",
            )],
        )
        .await?;
        return Ok(());
    };

    let guard = SentFlagGuard::new(&ctx.db, collection, field_path);
    if guard.try_begin(filter.clone()).await? == SendClaim::AlreadyHandled {
        info!(subject, field_path, "WhatsApp send already handled");
        return Ok(());
    }

    let outcome = match ctx.channels.whatsapp.send_template(phone, &template).await {
        Ok(()) => {
            guard.complete_ok(filter).await?;
            info!(subject, template = %template.name, "WhatsApp message sent");
            NotificationOutcome::sent(Channel::Whatsapp)
        }
        Err(e) => {
            warn!(subject, error = %e, "WhatsApp send failed");
            guard.complete_failed(filter, &e.to_string()).await?;
            NotificationOutcome::failed(Channel::Whatsapp, e.to_string())
        }
    };
    record_dispatch(&ctx.db, kind, subject, vec![outcome]).await?;
    Ok(())
}

fn pet_names(booking: &Booking) -> String {
    if booking.pet_names.is_empty() {
        "your pet(s)".to_string()
    } else {
        booking.pet_names.join(", ")
    }
}

/// Provider-confirmation template, sent once when the provider confirms.
pub(super) async fn send_sp_confirmation(
    ctx: &NotifyContext,
    booking: &Booking,
) -> ServiceResult<()> {
    let template = Composer::wa_sp_confirmed(
        booking.user_name.as_deref().unwrap_or(FALLBACK_PET_PARENT),
        booking.shop_name.as_deref().unwrap_or(FALLBACK_PARTNER),
        &booking.booking_ref,
        &format_dm_dates(&booking.selected_dates),
        &pet_names(booking),
    );
    guarded_send(
        ctx,
        Booking::COLLECTION,
        "wa_confirmation",
        doc! { "service_id": &booking.service_id, "booking_ref": &booking.booking_ref },
        booking.phone_number.as_deref(),
        template,
        EventKind::BookingUpdated,
        &format!("{}/{}", booking.service_id, booking.booking_ref),
    )
    .await
}

/// Booking-confirmation template to the user, sent once when the booking
/// reaches confirmed.
pub(super) async fn send_user_confirmation(
    ctx: &NotifyContext,
    booking: &Booking,
) -> ServiceResult<()> {
    let drop_date = booking
        .selected_dates
        .first()
        .map(|d| format_dm_dates(std::slice::from_ref(d)))
        .unwrap_or_else(|| "N/A".to_string());

    let template = Composer::wa_booking_confirmation(
        booking.user_name.as_deref().unwrap_or(FALLBACK_PET_PARENT),
        &booking.booking_ref,
        booking.shop_name.as_deref().unwrap_or(FALLBACK_PARTNER),
        &format_dm_dates(&booking.selected_dates),
        &pet_names(booking),
        &drop_date,
        booking.drop_time.as_deref().unwrap_or("N/A"),
    );
    guarded_send(
        ctx,
        Booking::COLLECTION,
        "wa_user_confirmation",
        doc! { "service_id": &booking.service_id, "booking_ref": &booking.booking_ref },
        booking.phone_number.as_deref(),
        template,
        EventKind::BookingUpdated,
        &format!("{}/{}", booking.service_id, booking.booking_ref),
    )
    .await
}

/// Completed-order writes: attach any parked payout, then send the
/// "order done" template once the end PIN has been redeemed.
pub async fn on_order_written(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let order_ref = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;

    // A payout initiated before the order document landed is parked in a
    // side collection; every order write is a chance to move it over.
    if let Err(e) = ctx
        .payouts
        .attach_pending_payout(&ctx.db, service_id, order_ref)
        .await
    {
        warn!(order_ref, error = %e, "Pending payout attach failed");
    }

    let orders: BaseDao<CompletedOrder> = BaseDao::new(&ctx.db, CompletedOrder::COLLECTION);
    let order = orders
        .find_one(doc! { "service_id": service_id, "order_ref": order_ref })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("order {order_ref} not found")))?;

    if !order.is_end_pin_used {
        return Ok(());
    }

    let template = Composer::wa_order_done(
        order.user_name.as_deref().unwrap_or(FALLBACK_PET_PARENT),
        order.shop_name.as_deref().unwrap_or(FALLBACK_PARTNER),
    );
    guarded_send(
        ctx,
        CompletedOrder::COLLECTION,
        "wa_order_done",
        doc! { "service_id": service_id, "order_ref": order_ref },
        order.phone_number.as_deref(),
        template,
        env.kind,
        &format!("{service_id}/{order_ref}"),
    )
    .await
}
