//! Business workflows shared by the HTTP handlers and background tasks

pub mod accounts;
pub mod applications;
pub mod expiry;
pub mod gift_cards;
pub mod invites;
pub mod purchase;
