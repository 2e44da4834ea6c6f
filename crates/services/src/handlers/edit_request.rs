use bson::doc;

use fellowpet_db::models::EditRequest;

use crate::dao::BaseDao;
use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;
use crate::guard::Transition;

use super::NotifyContext;

/// Profile edit review: notify the owner once `handled` flips, with the
/// outcome (all rejected, mixed, or all approved).
pub async fn on_updated(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    if !Transition::Rising.fired(env.before_bool("handled"), env.after_bool("handled")) {
        return Ok(());
    }

    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let request_id = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;

    let dao: BaseDao<EditRequest> = BaseDao::new(&ctx.db, EditRequest::COLLECTION);
    let request = dao
        .find_one(doc! { "service_id": service_id, "request_id": request_id })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("edit request {request_id} not found")))?;

    let total = request.approved_fields.len() + request.rejected_fields.len();
    let (push, email) = ctx.composer.edit_request_outcome(
        &request.approved_fields,
        &request.rejected_fields,
        total,
    );

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
        &format!("{service_id}/{request_id}"),
        outcomes,
    )
    .await?;
    Ok(())
}
