use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;
use crate::guard::Transition;

use super::NotifyContext;

/// Service profile updates: the admin-approval welcome and the two listing
/// visibility notices.
pub async fn on_updated(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;

    let approved_rose = Transition::Rising.fired(
        env.before_bool("admin_approved"),
        env.after_bool("admin_approved"),
    );
    let display_rose =
        Transition::Rising.fired(env.before_bool("display"), env.after_bool("display"));
    let display_fell =
        Transition::Falling.fired(env.before_bool("display"), env.after_bool("display"));

    if approved_rose {
        let profile = ctx
            .contacts
            .service_profile(service_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("service {service_id} not found")))?;
        let (push, email) = ctx
            .composer
            .approval_granted(profile.shop_name.as_deref().unwrap_or("your shop"));

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
        record_dispatch(&ctx.db, env.kind, service_id, outcomes).await?;
    }

    if display_fell {
        send_display_push(ctx, env, service_id, ctx.composer.suspension_approved()).await?;
    }

    // Going live as part of the initial approval is covered by the welcome
    // above; the "live again" notice is only for later re-listings.
    if display_rose && !approved_rose {
        send_display_push(ctx, env, service_id, ctx.composer.live_again()).await?;
    }

    Ok(())
}

async fn send_display_push(
    ctx: &NotifyContext,
    env: &ChangeEnvelope,
    service_id: &str,
    push: crate::channels::PushMessage,
) -> ServiceResult<()> {
    let recipients = ctx.contacts.resolve_service(service_id).await?;
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
    record_dispatch(&ctx.db, env.kind, service_id, outcomes).await?;
    Ok(())
}
