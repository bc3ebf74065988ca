//! Inter-branch transfer requests and their state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Location;

/// Status of a transfer request. Transitions are monotone: once a request
/// leaves `Pending` it can only move forward along the table below, and
/// `Delivered`/`Rejected`/`Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Delivered,
    Cancelled,
}

/// Action a responder (or the requester, for cancel) can take on a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Accept,
    Reject,
    Deliver,
    Cancel,
}

/// A request's status does not allow the attempted action
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot {action:?} a request in status {from:?}")]
pub struct InvalidTransition {
    pub from: RequestStatus,
    pub action: RequestAction,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Delivered => "delivered",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            "delivered" => Ok(RequestStatus::Delivered),
            "cancelled" => Ok(RequestStatus::Cancelled),
            _ => Err("unknown request status"),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Delivered | RequestStatus::Cancelled
        )
    }

    /// The complete transition table. Anything not listed here is an
    /// `InvalidTransition` and must leave the request untouched.
    pub fn apply(self, action: RequestAction) -> Result<RequestStatus, InvalidTransition> {
        match (self, action) {
            (RequestStatus::Pending, RequestAction::Accept) => Ok(RequestStatus::Accepted),
            (RequestStatus::Pending, RequestAction::Reject) => Ok(RequestStatus::Rejected),
            (RequestStatus::Pending, RequestAction::Cancel) => Ok(RequestStatus::Cancelled),
            (RequestStatus::Accepted, RequestAction::Deliver) => Ok(RequestStatus::Delivered),
            (from, action) => Err(InvalidTransition { from, action }),
        }
    }
}

/// A branch's request for stock from the warehouse or another branch.
/// Requests are never deleted; the full history is the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: Uuid,
    pub requesting_branch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub source: Location,
    pub status: RequestStatus,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub responded_by: Option<Uuid>,
    pub responded_at: Option<DateTime<Utc>>,
    pub request_notes: Option<String>,
    pub response_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
        RequestStatus::Delivered,
        RequestStatus::Cancelled,
    ];
    const ALL_ACTIONS: [RequestAction; 4] = [
        RequestAction::Accept,
        RequestAction::Reject,
        RequestAction::Deliver,
        RequestAction::Cancel,
    ];

    #[test]
    fn only_four_transitions_are_legal() {
        let mut legal = 0;
        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                if status.apply(action).is_ok() {
                    legal += 1;
                }
            }
        }
        assert_eq!(legal, 4);
    }

    #[test]
    fn terminal_statuses_admit_no_action() {
        for status in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            for action in ALL_ACTIONS {
                assert_eq!(
                    status.apply(action),
                    Err(InvalidTransition { from: status, action })
                );
            }
        }
    }

    #[test]
    fn cancelled_request_cannot_be_accepted() {
        let status = RequestStatus::Pending.apply(RequestAction::Cancel).unwrap();
        assert_eq!(status, RequestStatus::Cancelled);
        assert!(status.apply(RequestAction::Accept).is_err());
    }
}
