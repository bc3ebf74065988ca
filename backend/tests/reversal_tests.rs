//! Reversal engine tests
//!
//! Covers the validity window, the inverse ledger effect of a reversal,
//! and the clamped central counter.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use shared::{
    central_after_reversal, central_delta, derived_quantity, within_reversal_window, Location,
    MovementEvent, MovementKind, Shift, DEFAULT_REVERSAL_WINDOW_HOURS,
};

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
        shift: Shift::Evening,
        timestamp: Utc::now(),
        notes: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn window_boundary_is_inclusive() {
        let recorded = Utc::now();
        let window = DEFAULT_REVERSAL_WINDOW_HOURS;

        assert!(within_reversal_window(recorded, recorded, window));
        assert!(within_reversal_window(
            recorded,
            recorded + Duration::hours(window),
            window
        ));
        assert!(!within_reversal_window(
            recorded,
            recorded + Duration::hours(window) + Duration::seconds(1),
            window
        ));
    }

    #[test]
    fn window_length_is_configurable() {
        let recorded = Utc::now();
        assert!(!within_reversal_window(
            recorded,
            recorded + Duration::hours(3),
            2
        ));
        assert!(within_reversal_window(
            recorded,
            recorded + Duration::hours(3),
            4
        ));
    }

    /// Deleting the event restores the derived quantities at both
    /// endpoints to what they were before it was appended.
    #[test]
    fn reversal_undoes_the_ledger_effect() {
        let product = Uuid::new_v4();
        let branch = Location::Branch { id: Uuid::new_v4() };
        let mut events = vec![
            event(product, MovementKind::Inbound, 20, Location::Warehouse, branch),
            event(product, MovementKind::Outbound, 6, branch, Location::Customer),
        ];
        let reversed = events.pop().unwrap();

        assert_eq!(derived_quantity(&events, product, branch), 20);
        assert_eq!(
            derived_quantity(&events, product, Location::Customer),
            0
        );
        assert_eq!(reversed.quantity, 6);
    }

    /// An inbound reversal cannot drive the central counter negative when
    /// later outbounds already consumed part of the inflow.
    #[test]
    fn inbound_reversal_clamps_the_central_counter() {
        // in 10 -> counter 10; out 8 -> counter 2; reverse the inbound
        let mut central = 0i64;
        central += central_delta(MovementKind::Inbound, 10);
        central += central_delta(MovementKind::Outbound, 8);
        assert_eq!(central, 2);

        central = central_after_reversal(central, MovementKind::Inbound, 10);
        assert_eq!(central, 0);
    }

    #[test]
    fn outbound_reversal_restores_the_full_quantity() {
        let central = central_after_reversal(12, MovementKind::Outbound, 5);
        assert_eq!(central, 17);
    }

    #[test]
    fn transfer_reversal_leaves_the_counter_alone() {
        assert_eq!(central_after_reversal(9, MovementKind::Transfer, 100), 9);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i64> {
        1i64..=1000
    }

    fn kind_strategy() -> impl Strategy<Value = MovementKind> {
        prop_oneof![
            Just(MovementKind::Inbound),
            Just(MovementKind::Outbound),
            Just(MovementKind::Transfer),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Append-then-reverse is a no-op on every derived quantity.
        #[test]
        fn prop_reversal_round_trips_derived_quantities(
            seed in quantity_strategy(),
            qty in quantity_strategy(),
            kind in kind_strategy(),
        ) {
            let product = Uuid::new_v4();
            let branch = Location::Branch { id: Uuid::new_v4() };
            let other = Location::Dealer { id: Uuid::new_v4() };

            let mut events = vec![event(product, MovementKind::Inbound, seed, Location::Warehouse, branch)];
            let at_branch = derived_quantity(&events, product, branch);
            let at_other = derived_quantity(&events, product, other);

            let appended = match kind {
                MovementKind::Inbound => event(product, kind, qty, Location::Warehouse, branch),
                MovementKind::Outbound => event(product, kind, qty, branch, Location::Customer),
                MovementKind::Transfer => event(product, kind, qty, branch, other),
            };
            events.push(appended);
            events.pop();

            prop_assert_eq!(derived_quantity(&events, product, branch), at_branch);
            prop_assert_eq!(derived_quantity(&events, product, other), at_other);
        }

        /// The clamped counter never goes negative, whatever is reversed.
        #[test]
        fn prop_reversed_counter_is_never_negative(
            central in 0i64..=1000,
            qty in quantity_strategy(),
            kind in kind_strategy(),
        ) {
            prop_assert!(central_after_reversal(central, kind, qty) >= 0);
        }

        /// Outside the clamp region, reversal is the exact inverse of the
        /// append delta.
        #[test]
        fn prop_reversal_inverts_the_delta_when_unclamped(
            central in 0i64..=1000,
            qty in quantity_strategy(),
            kind in kind_strategy(),
        ) {
            let after_append = central + central_delta(kind, qty);
            // Only meaningful when the append itself kept the counter valid
            prop_assume!(after_append >= 0);
            let after_reversal = central_after_reversal(after_append, kind, qty);
            prop_assert_eq!(after_reversal, central);
        }

        /// Stale timestamps are rejected for every window length.
        #[test]
        fn prop_window_rejects_older_events(
            window in 1i64..=96,
            hours_past in 1i64..=200,
        ) {
            let recorded = Utc::now();
            let now = recorded + Duration::hours(window + hours_past);
            prop_assert!(!within_reversal_window(recorded, now, window));
        }
    }
}
