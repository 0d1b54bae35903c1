//! Admin API endpoints, split into sub-modules by domain

pub mod applications;
pub mod businesses;
pub mod fees;
pub mod invites;
pub mod system;
pub mod transactions;
