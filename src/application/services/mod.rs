//! Application services - Business logic orchestration

pub mod conversation;
pub mod ledger;

pub use conversation::{ConversationEngine, Reply};
pub use ledger::CurrencyLedger;
