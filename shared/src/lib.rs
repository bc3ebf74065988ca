//! Shared types and domain rules for the Branch Stock Management Platform
//!
//! This crate contains the types and pure stock rules shared between the
//! backend and other components of the system: the location model, movement
//! kinds and their effect on the central counter, ledger aggregation, the
//! transfer-request state machine and notification models.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
