//! Marketplace data models
//!
//! Row structs derive `sqlx::FromRow` when the `db` feature is on.
//! Timestamps are epoch milliseconds; money is `rust_decimal::Decimal`.

pub mod account;
pub mod application;
pub mod business;
pub mod fee;
pub mod gift_card;
pub mod ledger;

pub use account::*;
pub use application::*;
pub use business::*;
pub use fee::*;
pub use gift_card::*;
pub use ledger::*;
