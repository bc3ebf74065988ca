//! HTTP handlers for the Branch Stock Management Platform

pub mod catalog;
pub mod health;
pub mod movements;
pub mod notifications;
pub mod requests;
pub mod stock;

pub use catalog::*;
pub use health::*;
pub use movements::*;
pub use notifications::*;
pub use requests::*;
pub use stock::*;
