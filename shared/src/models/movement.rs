//! Movement ledger models and aggregation rules
//!
//! The ledger is the single source of truth for stock at any location: a
//! location's quantity is the sum of movements into it minus the sum of
//! movements out of it. The central counter is a materialized derivative
//! that moves in lockstep with `Inbound`/`Outbound` appends and reversals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Location, MovementKind, Shift};

/// An appended, immutable ledger entry. Deleted only by the reversal engine
/// inside its validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementEvent {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub kind: MovementKind,
    pub source: Location,
    pub destination: Location,
    pub actor_id: Uuid,
    pub shift: Shift,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// One line of a movement batch before it is appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product_id: Uuid,
    pub quantity: i64,
    pub kind: MovementKind,
    pub source: Location,
    pub destination: Location,
    pub shift: Shift,
    pub notes: Option<String>,
}

/// Signed effect of appending a movement on the product's central counter.
///
/// The counter tracks every `Inbound`/`Outbound` regardless of which
/// location is involved; `Transfer` moves stock between locations without
/// changing the system total.
pub fn central_delta(kind: MovementKind, quantity: i64) -> i64 {
    match kind {
        MovementKind::Inbound => quantity,
        MovementKind::Outbound => -quantity,
        MovementKind::Transfer => 0,
    }
}

/// Central counter value after reversing a movement of the given kind.
///
/// Inbound reversals clamp at zero rather than going negative; outbound
/// reversals restore the quantity unclamped; transfer reversals leave the
/// counter untouched.
pub fn central_after_reversal(central: i64, kind: MovementKind, quantity: i64) -> i64 {
    match kind {
        MovementKind::Inbound => (central - quantity).max(0),
        MovementKind::Outbound => central + quantity,
        MovementKind::Transfer => central,
    }
}

/// Stock of a product at a location, derived from a sequence of events:
/// sum of quantities arriving at the location minus sum of quantities
/// leaving it.
pub fn derived_quantity<'a, I>(events: I, product_id: Uuid, location: Location) -> i64
where
    I: IntoIterator<Item = &'a MovementEvent>,
{
    events
        .into_iter()
        .filter(|e| e.product_id == product_id)
        .map(|e| {
            let mut qty = 0;
            if e.destination == location {
                qty += e.quantity;
            }
            if e.source == location {
                qty -= e.quantity;
            }
            qty
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(
        product_id: Uuid,
        kind: MovementKind,
        quantity: i64,
        source: Location,
        destination: Location,
    ) -> MovementEvent {
        MovementEvent {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            kind,
            source,
            destination,
            actor_id: Uuid::new_v4(),
            shift: Shift::Morning,
            timestamp: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn derived_quantity_sums_in_minus_out() {
        let product = Uuid::new_v4();
        let branch = Location::Branch { id: Uuid::new_v4() };
        let other = Location::Branch { id: Uuid::new_v4() };
        let events = vec![
            event(product, MovementKind::Inbound, 20, Location::Warehouse, branch),
            event(product, MovementKind::Transfer, 5, branch, other),
            event(product, MovementKind::Outbound, 3, branch, Location::Customer),
        ];
        assert_eq!(derived_quantity(&events, product, branch), 12);
        assert_eq!(derived_quantity(&events, product, other), 5);
    }

    #[test]
    fn derived_quantity_ignores_other_products() {
        let product = Uuid::new_v4();
        let branch = Location::Branch { id: Uuid::new_v4() };
        let events = vec![event(
            Uuid::new_v4(),
            MovementKind::Inbound,
            50,
            Location::Warehouse,
            branch,
        )];
        assert_eq!(derived_quantity(&events, product, branch), 0);
    }

    #[test]
    fn transfer_never_moves_central_counter() {
        assert_eq!(central_delta(MovementKind::Transfer, 100), 0);
        assert_eq!(central_after_reversal(40, MovementKind::Transfer, 100), 40);
    }

    #[test]
    fn inbound_reversal_clamps_at_zero() {
        assert_eq!(central_after_reversal(5, MovementKind::Inbound, 8), 0);
        assert_eq!(central_after_reversal(10, MovementKind::Inbound, 8), 2);
    }

    #[test]
    fn outbound_reversal_restores_unclamped() {
        assert_eq!(central_after_reversal(40, MovementKind::Outbound, 10), 50);
    }
}
