//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product tracked by the stock ledger.
///
/// `central_quantity` is the materialized running counter. It moves only on
/// `Inbound`/`Outbound` ledger appends and their reversals, never on
/// `Transfer`, and never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub unit_price: Decimal,
    pub central_quantity: i64,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A flat product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}
