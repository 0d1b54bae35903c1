//! Database access layer

pub mod accounts;
pub mod applications;
pub mod businesses;
pub mod fees;
pub mod gift_cards;
pub mod invites;
pub mod ledger;
pub mod webhook_events;
