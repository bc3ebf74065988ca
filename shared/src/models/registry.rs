//! Location registry models: branches and external dealers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A branch holding its own stock, derived from the movement ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub manager_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An external dealer that can be the source or destination of movements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dealer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}
