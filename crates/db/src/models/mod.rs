pub mod booking;
pub mod chat;
pub mod edit_request;
pub mod email_change;
pub mod employee;
pub mod lookup;
pub mod order;
pub mod outcome;
pub mod payout;
pub mod service;
pub mod user;
pub mod verification;

pub use booking::{Booking, OrderStatus, WaSendState};
pub use chat::{Chat, ChatMessage, ChatNotificationSent, ChatParty};
pub use edit_request::EditRequest;
pub use email_change::{ChangeKind, EmailChangeRequest, Party};
pub use lookup::{DailySummary, PetPricing};
pub use employee::{Employee, Task, TaskSubmission};
pub use order::{CompletedOrder, PayoutInfo};
pub use outcome::{Channel, DispatchRecord, NotificationOutcome, OutcomeStatus};
pub use payout::{PendingPayout, WebhookLog};
pub use service::{PushContact, ServiceProfile};
pub use user::{AccountStatus, AppUser};
pub use verification::{Purpose, VerificationCode};
