//! Domain models for the Branch Stock Management Platform

pub mod movement;
pub mod notification;
pub mod product;
pub mod registry;
pub mod request;
pub mod user;

pub use movement::*;
pub use notification::*;
pub use product::*;
pub use registry::*;
pub use request::*;
pub use user::*;
