use thiserror::Error;

use crate::channels::ChannelError;
use crate::dao::base::DaoError;

/// Errors surfaced by the callable workflows. Each variant corresponds to one
/// structured error code the API layer maps onto an HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    DeadlineExceeded(String),
    #[error("{0}")]
    FailedPrecondition(String),
    #[error("Database error: {0}")]
    Dao(#[from] DaoError),
    #[error("Delivery error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ServiceError {
    /// The wire-level error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid-argument",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::PermissionDenied(_) => "permission-denied",
            Self::NotFound(_) | Self::Dao(DaoError::NotFound) => "not-found",
            Self::AlreadyExists(_) | Self::Dao(DaoError::DuplicateKey(_)) => "already-exists",
            Self::DeadlineExceeded(_) => "deadline-exceeded",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::Dao(_) | Self::Channel(_) | Self::Upstream(_) => "internal",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
