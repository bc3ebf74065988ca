//! Validation rules for the stock ledger
//!
//! Free-function validators shared by the backend services. Everything here
//! is checked before any mutation so a failed validation leaves no trace.

use chrono::{DateTime, Duration, Utc};

use crate::models::MovementDraft;
use crate::types::{Location, MovementKind};

/// Hours a movement stays reversible after it was recorded
pub const DEFAULT_REVERSAL_WINDOW_HOURS: i64 = 24;

/// Movement and request quantities are whole units, at least one
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Endpoint rules for a single movement line: customers never supply stock,
/// and a transfer must connect two distinct locations.
pub fn validate_endpoints(
    kind: MovementKind,
    source: Location,
    destination: Location,
) -> Result<(), &'static str> {
    if source.is_sink() {
        return Err("Customer location cannot be a movement source");
    }
    if kind == MovementKind::Transfer && source == destination {
        return Err("Transfer source and destination must differ");
    }
    Ok(())
}

/// Full pre-append validation of a draft line
pub fn validate_movement_draft(draft: &MovementDraft) -> Result<(), &'static str> {
    validate_quantity(draft.quantity)?;
    validate_endpoints(draft.kind, draft.source, draft.destination)?;
    Ok(())
}

/// A request may only target the warehouse or a branch as its source
pub fn validate_request_source(source: Location) -> Result<(), &'static str> {
    match source {
        Location::Warehouse | Location::Branch { .. } => Ok(()),
        _ => Err("Requests can only draw from the warehouse or a branch"),
    }
}

/// Whether a movement recorded at `timestamp` is still reversible at `now`
pub fn within_reversal_window(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    window_hours: i64,
) -> bool {
    now - timestamp <= Duration::hours(window_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn customer_cannot_be_a_source() {
        let branch = Location::Branch { id: Uuid::new_v4() };
        assert!(validate_endpoints(MovementKind::Outbound, Location::Customer, branch).is_err());
        assert!(validate_endpoints(MovementKind::Outbound, branch, Location::Customer).is_ok());
    }

    #[test]
    fn transfer_endpoints_must_differ() {
        let branch = Location::Branch { id: Uuid::new_v4() };
        assert!(validate_endpoints(MovementKind::Transfer, branch, branch).is_err());
        assert!(validate_endpoints(MovementKind::Transfer, branch, Location::Warehouse).is_ok());
    }

    #[test]
    fn reversal_window_is_inclusive_of_the_boundary() {
        let ts = Utc::now();
        assert!(within_reversal_window(ts, ts + Duration::hours(24), 24));
        assert!(!within_reversal_window(
            ts,
            ts + Duration::hours(25),
            DEFAULT_REVERSAL_WINDOW_HOURS
        ));
    }

    #[test]
    fn request_source_excludes_dealers_and_customers() {
        assert!(validate_request_source(Location::Warehouse).is_ok());
        assert!(validate_request_source(Location::Branch { id: Uuid::new_v4() }).is_ok());
        assert!(validate_request_source(Location::Dealer { id: Uuid::new_v4() }).is_err());
        assert!(validate_request_source(Location::Customer).is_err());
    }
}
