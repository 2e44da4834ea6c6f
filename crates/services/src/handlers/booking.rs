use bson::doc;

use fellowpet_db::models::Booking;

use crate::compose::{FALLBACK_USER, format_long_dates, format_weekday_dates};
use crate::dao::BaseDao;
use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;
use crate::guard::{Transition, entered_state};

use super::{NotifyContext, whatsapp};

async fn load_booking(
    ctx: &NotifyContext,
    service_id: &str,
    booking_ref: &str,
) -> ServiceResult<Booking> {
    let dao: BaseDao<Booking> = BaseDao::new(&ctx.db, Booking::COLLECTION);
    dao.find_one(doc! { "service_id": service_id, "booking_ref": booking_ref })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("booking {booking_ref} not found")))
}

/// New booking request: push + email to the service provider.
pub async fn on_created(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let booking_ref = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;

    let booking = load_booking(ctx, service_id, booking_ref).await?;
    let long_dates = format_long_dates(&booking.selected_dates);
    let user_name = booking.user_name.as_deref().unwrap_or(FALLBACK_USER);
    let user_id = booking.user_id.as_deref().unwrap_or("unknown");

    let (push, email) = ctx.composer.booking_request(user_name, user_id, &long_dates);
    let recipients = ctx.contacts.resolve_service(service_id).await?;
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                email: Some(email),
                whatsapp: None,
            },
        )
        .await;
    record_dispatch(
        &ctx.db,
        env.kind,
        &format!("{service_id}/{booking_ref}"),
        outcomes,
    )
    .await?;
    Ok(())
}

/// Booking updates fan out to several notices, each guarded by its own
/// transition so redeliveries and unrelated writes stay silent.
pub async fn on_updated(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let booking_ref = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;
    let booking = load_booking(ctx, service_id, booking_ref).await?;

    let before_status = env.before_str("order_status");
    let after_status = env.after_str("order_status");

    if entered_state(before_status, after_status, "confirmed") {
        notify_sp_confirmed(ctx, env, &booking).await?;
        notify_user_accepted(ctx, env, &booking).await?;
        whatsapp::send_user_confirmation(ctx, &booking).await?;
    }

    let cancelled = entered_state(before_status, after_status, "sp_cancellation")
        || entered_state(before_status, after_status, "user_cancellation");
    if cancelled {
        notify_user_canceled(ctx, env, &booking).await?;
    }
    if entered_state(before_status, after_status, "user_cancellation") {
        notify_sp_cancellation(ctx, env, &booking, false).await?;
    }

    // Dates dropped without the whole booking being cancelled.
    let before_cancelled = env
        .before_field("cancelled_dates")
        .and_then(|v| v.as_array())
        .map_or(0, Vec::len);
    let after_cancelled = env
        .after_field("cancelled_dates")
        .and_then(|v| v.as_array())
        .map_or(0, Vec::len);
    if after_cancelled > before_cancelled && after_status != Some("user_cancellation") {
        notify_sp_cancellation(ctx, env, &booking, true).await?;
    }

    if Transition::Rising.fired(env.before_bool("sp_confirmation"), env.after_bool("sp_confirmation"))
    {
        whatsapp::send_sp_confirmation(ctx, &booking).await?;
    }

    Ok(())
}

async fn notify_sp_confirmed(
    ctx: &NotifyContext,
    env: &ChangeEnvelope,
    booking: &Booking,
) -> ServiceResult<()> {
    let long_dates = format_long_dates(&booking.selected_dates);
    let user_name = booking.user_name.as_deref().unwrap_or(FALLBACK_USER);
    let (push, email) = ctx
        .composer
        .booking_confirmed(user_name, &booking.booking_ref, &long_dates);

    let recipients = ctx.contacts.resolve_service(&booking.service_id).await?;
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                email: Some(email),
                whatsapp: None,
            },
        )
        .await;
    record_dispatch(
        &ctx.db,
        env.kind,
        &format!("{}/{}", booking.service_id, booking.booking_ref),
        outcomes,
    )
    .await?;
    Ok(())
}

async fn notify_user_accepted(
    ctx: &NotifyContext,
    env: &ChangeEnvelope,
    booking: &Booking,
) -> ServiceResult<()> {
    let Some(user_id) = booking.user_id.as_deref() else {
        return Ok(());
    };

    let long_dates = if booking.selected_dates.is_empty() {
        "N/A".to_string()
    } else {
        format_long_dates(&booking.selected_dates)
    };
    let pets = if booking.pet_names.is_empty() {
        "your pet(s)".to_string()
    } else {
        booking.pet_names.join(", ")
    };
    let push = ctx.composer.request_accepted(
        &long_dates,
        booking.open_time.as_deref().unwrap_or("opening time"),
        booking.close_time.as_deref().unwrap_or("closing time"),
        &pets,
    );

    let recipients = ctx.contacts.resolve_user(user_id).await?;
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                ..Default::default()
            },
        )
        .await;
    record_dispatch(
        &ctx.db,
        env.kind,
        &format!("{}/{}/user", booking.service_id, booking.booking_ref),
        outcomes,
    )
    .await?;
    Ok(())
}

async fn notify_user_canceled(
    ctx: &NotifyContext,
    env: &ChangeEnvelope,
    booking: &Booking,
) -> ServiceResult<()> {
    let Some(user_id) = booking.user_id.as_deref() else {
        return Ok(());
    };

    let reason = booking
        .rejection_reason
        .as_deref()
        .unwrap_or("an unspecified reason");
    let push = ctx.composer.request_canceled(reason);

    let recipients = ctx.contacts.resolve_user(user_id).await?;
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                ..Default::default()
            },
        )
        .await;
    record_dispatch(
        &ctx.db,
        env.kind,
        &format!("{}/{}/user", booking.service_id, booking.booking_ref),
        outcomes,
    )
    .await?;
    Ok(())
}

async fn notify_sp_cancellation(
    ctx: &NotifyContext,
    env: &ChangeEnvelope,
    booking: &Booking,
    partial: bool,
) -> ServiceResult<()> {
    let user_name = booking.user_name.as_deref().unwrap_or(FALLBACK_USER);
    let dates = if booking.cancelled_dates.is_empty() {
        &booking.selected_dates
    } else {
        &booking.cancelled_dates
    };
    let weekday_dates = format_weekday_dates(dates);

    let (push, email) = if partial {
        ctx.composer
            .partial_cancellation(user_name, &booking.booking_ref, &weekday_dates)
    } else {
        ctx.composer
            .user_cancellation(user_name, &booking.booking_ref, &weekday_dates)
    };

    let recipients = ctx.contacts.resolve_service(&booking.service_id).await?;
    let outcomes = ctx
        .channels
        .dispatch(
            &recipients,
            Dispatch {
                push: Some(push),
                email: Some(email),
                whatsapp: None,
            },
        )
        .await;
    record_dispatch(
        &ctx.db,
        env.kind,
        &format!("{}/{}", booking.service_id, booking.booking_ref),
        outcomes,
    )
    .await?;
    Ok(())
}
