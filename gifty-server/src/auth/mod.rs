//! Authentication middleware: JWT identities, role guards, rate limiting

pub mod jwt;
pub mod rate_limit;

pub use jwt::Identity;
