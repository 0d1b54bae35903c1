//! Gift card domain logic
//!
//! Pure functions only: code generation and normalization, lifecycle
//! evaluation, redemption planning and the purchase fee split. The server
//! wraps these with persistence and provider calls.

pub mod code;
pub mod fees;
pub mod lifecycle;

pub use code::{fallback_code, generate_code, is_canonical, normalize_code};
pub use fees::{FeeSplit, to_minor_units, validate_fee_percentage};
pub use lifecycle::{CardState, MAX_AMOUNT, RedemptionPlan, plan_redemption, validate_amount};
