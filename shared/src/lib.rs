//! Shared types for the Gifty marketplace
//!
//! Error types, data models and the pure gift-card domain logic used by
//! the HTTP service.

pub mod error;
pub mod gift_card;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
