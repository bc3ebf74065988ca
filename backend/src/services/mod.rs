//! Business logic services for the Branch Stock Management Platform

pub mod authz;
pub mod catalog;
pub mod ledger;
pub mod notification;
pub mod requests;
pub mod reversal;
pub mod stock;

pub use catalog::CatalogService;
pub use ledger::LedgerService;
pub use notification::NotificationService;
pub use requests::RequestService;
pub use reversal::ReversalService;
pub use stock::StockService;
