use crate::error::{ServiceError, ServiceResult};
use crate::events::ChangeEnvelope;
use crate::guard::entered_state;

use super::NotifyContext;

/// User account updates: the active→locked transition triggers the lock
/// notice and starts the removal grace period.
pub async fn on_updated(ctx: &NotifyContext, env: &ChangeEnvelope) -> ServiceResult<()> {
    let uid = env.uid.as_deref().filter(|s| !s.is_empty()).ok_or_else(|| {
        ServiceError::InvalidArgument(format!("{} event missing uid", env.kind.as_str()))
    })?;

    if entered_state(
        env.before_str("account_status"),
        env.after_str("account_status"),
        "locked",
    ) {
        ctx.accounts.on_account_locked(uid).await?;
    }
    Ok(())
}
