//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock-holding place. The warehouse is a singleton, branches and dealers
/// are identified rows, and `Customer` is a sink used by point-of-sale
/// consumption: stock can flow to a customer but never from one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Warehouse,
    Branch { id: Uuid },
    Dealer { id: Uuid },
    Customer,
}

impl Location {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Location::Warehouse => "warehouse",
            Location::Branch { .. } => "branch",
            Location::Dealer { .. } => "dealer",
            Location::Customer => "customer",
        }
    }

    /// The row id for branches and dealers; `None` for the warehouse and
    /// customer singletons.
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            Location::Branch { id } | Location::Dealer { id } => Some(*id),
            _ => None,
        }
    }

    /// Rebuild a location from its persisted `(type, id)` column pair.
    pub fn from_parts(kind: &str, id: Option<Uuid>) -> Result<Self, &'static str> {
        match (kind, id) {
            ("warehouse", None) => Ok(Location::Warehouse),
            ("customer", None) => Ok(Location::Customer),
            ("branch", Some(id)) => Ok(Location::Branch { id }),
            ("dealer", Some(id)) => Ok(Location::Dealer { id }),
            ("branch", None) | ("dealer", None) => Err("branch/dealer location requires an id"),
            ("warehouse", Some(_)) | ("customer", Some(_)) => {
                Err("warehouse/customer location carries no id")
            }
            _ => Err("unknown location type"),
        }
    }

    /// Customers consume stock; they never hold or supply it.
    pub fn is_sink(&self) -> bool {
        matches!(self, Location::Customer)
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Location::Branch { .. })
    }

    pub fn branch_id(&self) -> Option<Uuid> {
        match self {
            Location::Branch { id } => Some(*id),
            _ => None,
        }
    }
}

/// Kind of a ledger movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock entering the system (purchase, supply)
    Inbound,
    /// Stock leaving the system (sale, write-off)
    Outbound,
    /// Stock moving between two stock-holding locations
    Transfer,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "in",
            MovementKind::Outbound => "out",
            MovementKind::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s {
            "in" => Ok(MovementKind::Inbound),
            "out" => Ok(MovementKind::Outbound),
            "transfer" => Ok(MovementKind::Transfer),
            _ => Err("unknown movement kind"),
        }
    }
}

/// Work shift a movement was recorded under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Evening,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Evening => "evening",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s {
            "morning" => Ok(Shift::Morning),
            "evening" => Ok(Shift::Evening),
            _ => Err("unknown shift"),
        }
    }

    /// Shift covering the given wall-clock time; the evening shift starts
    /// at 14:00.
    pub fn covering(at: chrono::DateTime<chrono::Utc>) -> Self {
        use chrono::Timelike;
        if at.hour() < 14 {
            Shift::Morning
        } else {
            Shift::Evening
        }
    }
}

/// Actor roles resolved by the identity provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    BranchManager,
    BranchEmployee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BranchManager => "branch_manager",
            Role::BranchEmployee => "branch_employee",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s {
            "admin" => Ok(Role::Admin),
            "branch_manager" => Ok(Role::BranchManager),
            "branch_employee" => Ok(Role::BranchEmployee),
            _ => Err("unknown role"),
        }
    }
}
