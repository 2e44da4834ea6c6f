use bson::doc;

use fellowpet_db::models::{Task, TaskSubmission};

use crate::compose::{
    FALLBACK_ACTOR, FALLBACK_EMPLOYEE, FALLBACK_TASK_TITLE, format_full_date,
};
use crate::dao::BaseDao;
use crate::dispatch::{Dispatch, record_dispatch};
use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;

use super::NotifyContext;

async fn load_task(ctx: &NotifyContext, service_id: &str, task_id: &str) -> ServiceResult<Task> {
    let dao: BaseDao<Task> = BaseDao::new(&ctx.db, Task::COLLECTION);
    dao.find_one(doc! { "service_id": service_id, "task_id": task_id })
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("task {task_id} not found")))
}

async fn employee_name(
    ctx: &NotifyContext,
    service_id: &str,
    employee_id: Option<&str>,
    fallback: &str,
) -> ServiceResult<String> {
    let Some(employee_id) = employee_id.filter(|id| !id.is_empty()) else {
        return Ok(fallback.to_string());
    };
    let name = ctx
        .contacts
        .employee(service_id, employee_id)
        .await?
        .and_then(|e| e.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Ok(name)
}

/// New task: notify the assigned employee on their devices and email.
pub async fn on_created(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let task_id = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;
    let task = load_task(ctx, service_id, task_id).await?;

    let creator =
        employee_name(ctx, service_id, task.created_by.as_deref(), FALLBACK_ACTOR).await?;
    let assignee =
        employee_name(ctx, service_id, Some(&task.assigned_to), FALLBACK_EMPLOYEE).await?;

    let (push, email) = ctx.composer.task_assigned(
        &creator,
        &assignee,
        task.title.as_deref().unwrap_or(FALLBACK_TASK_TITLE),
        task.description
            .as_deref()
            .unwrap_or("No description provided"),
    );

    let recipients = ctx
        .contacts
        .resolve_employee(service_id, &task.assigned_to)
        .await?;
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
    record_dispatch(&ctx.db, env.kind, &format!("{service_id}/{task_id}"), outcomes).await?;
    Ok(())
}

/// Task submitted: notify whoever created the task.
pub async fn on_submitted(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let service_id = env
        .require_service_id()
        .map_err(ServiceError::InvalidArgument)?;
    let task_id = env.require_doc_id().map_err(ServiceError::InvalidArgument)?;
    let task = load_task(ctx, service_id, task_id).await?;

    let Some(created_by) = task.created_by.as_deref().filter(|id| !id.is_empty()) else {
        // Nobody to notify for self-originated tasks.
        return Ok(());
    };

    let assignee =
        employee_name(ctx, service_id, Some(&task.assigned_to), FALLBACK_EMPLOYEE).await?;
    let creator = employee_name(ctx, service_id, Some(created_by), FALLBACK_ACTOR).await?;

    // The submission document carries the authoritative timestamp.
    let submissions: BaseDao<TaskSubmission> = BaseDao::new(&ctx.db, TaskSubmission::COLLECTION);
    let submitted_at = submissions
        .find_many(
            doc! { "service_id": service_id, "task_id": task_id },
            Some(doc! { "submitted_at": -1 }),
        )
        .await?
        .into_iter()
        .next()
        .map(|s| s.submitted_at)
        .unwrap_or_else(bson::DateTime::now);
    let submitted_date = format_full_date(submitted_at);

    let (push, email) = ctx.composer.task_submitted(
        &assignee,
        &creator,
        task.title.as_deref().unwrap_or(FALLBACK_TASK_TITLE),
        &submitted_date,
    );

    let recipients = ctx.contacts.resolve_employee(service_id, created_by).await?;
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
    record_dispatch(&ctx.db, env.kind, &format!("{service_id}/{task_id}"), outcomes).await?;
    Ok(())
}
