//! Notification models
//!
//! Notifications are outbox rows: the row is written in the same transaction
//! as the ledger or workflow mutation that produced it, and delivery is a
//! separate best-effort step that can never roll the mutation back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events the core emits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    RequestCreated,
    RequestAccepted,
    RequestRejected,
    RequestDelivered,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LowStock => "low_stock",
            NotificationKind::RequestCreated => "request_created",
            NotificationKind::RequestAccepted => "request_accepted",
            NotificationKind::RequestRejected => "request_rejected",
            NotificationKind::RequestDelivered => "request_delivered",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s {
            "low_stock" => Ok(NotificationKind::LowStock),
            "request_created" => Ok(NotificationKind::RequestCreated),
            "request_accepted" => Ok(NotificationKind::RequestAccepted),
            "request_rejected" => Ok(NotificationKind::RequestRejected),
            "request_delivered" => Ok(NotificationKind::RequestDelivered),
            _ => Err("unknown notification kind"),
        }
    }

    /// Low-stock alerts and rejections are flagged urgent in the feed.
    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            NotificationKind::LowStock | NotificationKind::RequestRejected
        )
    }
}

/// Who a notification is addressed to: a specific branch, or the
/// administrators' feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "recipient", content = "branch_id")]
pub enum Recipient {
    Branch(Uuid),
    Admins,
}

impl Recipient {
    /// Persisted as a nullable branch column: NULL addresses administrators.
    pub fn branch_column(&self) -> Option<Uuid> {
        match self {
            Recipient::Branch(id) => Some(*id),
            Recipient::Admins => None,
        }
    }

    pub fn from_branch_column(id: Option<Uuid>) -> Self {
        match id {
            Some(id) => Recipient::Branch(id),
            None => Recipient::Admins,
        }
    }
}

/// A single notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub product_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub is_urgent: bool,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Idempotent: the first call sets `read_at`, later calls change nothing.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(now);
        }
    }
}
