pub mod accounts;
pub mod channels;
pub mod compose;
pub mod contacts;
pub mod dao;
pub mod dispatch;
pub mod email_change;
pub mod error;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod payouts;
pub mod verification;

pub use accounts::AccountService;
pub use contacts::ContactResolver;
pub use dao::*;
pub use dispatch::ChannelSet;
pub use email_change::EmailChangeService;
pub use error::{ServiceError, ServiceResult};
pub use handlers::NotifyContext;
pub use payouts::PayoutService;
pub use verification::VerificationService;
