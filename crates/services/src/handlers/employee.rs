use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;

use super::NotifyContext;

/// New employee: notify the service owner's devices and email.
pub async fn on_created(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let employee_id = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;

    let employee = ctx
        .contacts
        .employee(service_id, employee_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("employee {employee_id} not found")))?;

    let (push, email) = ctx.composer.employee_added(
        employee.name.as_deref().unwrap_or("A new employee"),
        employee.role.as_deref().unwrap_or("Unspecified Role"),
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
        &format!("{service_id}/{employee_id}"),
        outcomes,
    )
    .await?;
    Ok(())
}
