pub mod email_change;
pub mod events;
pub mod lookup;
pub mod payouts;
pub mod verification;
