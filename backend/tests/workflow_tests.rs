//! Transfer request workflow tests
//!
//! Exercises the request state machine and the ledger effect of an
//! accepted request.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use shared::{
    derived_quantity, InvalidTransition, Location, MovementEvent, MovementKind, RequestAction,
    RequestStatus, Shift,
};

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

/// Apply Accept the way the workflow composes it: the transition and the
/// availability rule at a branch source are checked before anything
/// changes, and only then is the transfer appended.
fn try_accept(
    events: &mut Vec<MovementEvent>,
    status: RequestStatus,
    product: Uuid,
    source: Location,
    requester: Location,
    quantity: i64,
) -> Result<RequestStatus, &'static str> {
    let next = status
        .apply(RequestAction::Accept)
        .map_err(|_| "invalid transition")?;
    if source.is_branch() && derived_quantity(events.iter(), product, source) < quantity {
        return Err("insufficient stock at source");
    }
    events.push(event(
        product,
        MovementKind::Transfer,
        quantity,
        source,
        requester,
    ));
    Ok(next)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn happy_path_runs_pending_accepted_delivered() {
        let status = RequestStatus::Pending;
        let status = status.apply(RequestAction::Accept).unwrap();
        assert_eq!(status, RequestStatus::Accepted);
        let status = status.apply(RequestAction::Deliver).unwrap();
        assert_eq!(status, RequestStatus::Delivered);
        assert!(status.is_terminal());
    }

    #[test]
    fn rejection_is_terminal() {
        let status = RequestStatus::Pending.apply(RequestAction::Reject).unwrap();
        assert_eq!(status, RequestStatus::Rejected);
        for action in ALL_ACTIONS {
            assert!(status.apply(action).is_err());
        }
    }

    #[test]
    fn cancel_only_works_while_pending() {
        assert_eq!(
            RequestStatus::Pending.apply(RequestAction::Cancel),
            Ok(RequestStatus::Cancelled)
        );
        // Once accepted, stock has moved; the requester can no longer back out
        assert_eq!(
            RequestStatus::Accepted.apply(RequestAction::Cancel),
            Err(InvalidTransition {
                from: RequestStatus::Accepted,
                action: RequestAction::Cancel,
            })
        );
    }

    #[test]
    fn deliver_requires_prior_acceptance() {
        assert!(RequestStatus::Pending.apply(RequestAction::Deliver).is_err());
        assert!(RequestStatus::Rejected.apply(RequestAction::Deliver).is_err());
    }

    #[test]
    fn failed_transition_reports_origin_and_action() {
        let err = RequestStatus::Delivered
            .apply(RequestAction::Accept)
            .unwrap_err();
        assert_eq!(err.from, RequestStatus::Delivered);
        assert_eq!(err.action, RequestAction::Accept);
    }

    /// Accepting a request posts one transfer movement; the requesting
    /// branch gains exactly the granted quantity and the source loses it.
    #[test]
    fn acceptance_moves_stock_through_the_ledger() {
        let product = Uuid::new_v4();
        let source = Location::Branch { id: Uuid::new_v4() };
        let requester = Location::Branch { id: Uuid::new_v4() };

        let mut events = vec![event(
            product,
            MovementKind::Inbound,
            40,
            Location::Warehouse,
            source,
        )];

        let status = try_accept(
            &mut events,
            RequestStatus::Pending,
            product,
            source,
            requester,
            15,
        )
        .unwrap();

        assert_eq!(status, RequestStatus::Accepted);
        assert_eq!(events.len(), 2);
        assert_eq!(derived_quantity(&events, product, source), 25);
        assert_eq!(derived_quantity(&events, product, requester), 15);
    }

    /// A source branch holding less than the requested quantity blocks
    /// the acceptance entirely: the request stays pending and no transfer
    /// is appended.
    #[test]
    fn short_stock_leaves_request_pending_and_ledger_untouched() {
        let product = Uuid::new_v4();
        let source = Location::Branch { id: Uuid::new_v4() };
        let requester = Location::Branch { id: Uuid::new_v4() };

        let mut events = vec![event(
            product,
            MovementKind::Inbound,
            3,
            Location::Warehouse,
            source,
        )];
        let status = RequestStatus::Pending;

        let outcome = try_accept(&mut events, status, product, source, requester, 5);

        assert_eq!(outcome, Err("insufficient stock at source"));
        assert_eq!(status, RequestStatus::Pending);
        assert_eq!(events.len(), 1);
        assert_eq!(derived_quantity(&events, product, source), 3);
        assert_eq!(derived_quantity(&events, product, requester), 0);

        // The same request can still be accepted once stock arrives
        events.push(event(
            product,
            MovementKind::Inbound,
            10,
            Location::Warehouse,
            source,
        ));
        let status = try_accept(&mut events, status, product, source, requester, 5).unwrap();
        assert_eq!(status, RequestStatus::Accepted);
        assert_eq!(derived_quantity(&events, product, requester), 5);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn action_strategy() -> impl Strategy<Value = RequestAction> {
        prop_oneof![
            Just(RequestAction::Accept),
            Just(RequestAction::Reject),
            Just(RequestAction::Deliver),
            Just(RequestAction::Cancel),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// No action sequence ever reaches a status outside the known set,
        /// and a failed action leaves the status unchanged.
        #[test]
        fn prop_status_stays_in_the_legal_set(
            actions in prop::collection::vec(action_strategy(), 1..20)
        ) {
            let mut status = RequestStatus::Pending;
            for action in actions {
                match status.apply(action) {
                    Ok(next) => status = next,
                    Err(err) => prop_assert_eq!(err.from, status),
                }
                prop_assert!(ALL_STATUSES.contains(&status));
            }
        }

        /// At most two actions can ever succeed on one request
        /// (accept then deliver); every other path stops after one.
        #[test]
        fn prop_at_most_two_transitions_succeed(
            actions in prop::collection::vec(action_strategy(), 1..30)
        ) {
            let mut status = RequestStatus::Pending;
            let mut succeeded = 0;
            for action in actions {
                if let Ok(next) = status.apply(action) {
                    status = next;
                    succeeded += 1;
                }
            }
            prop_assert!(succeeded <= 2);
            if succeeded == 2 {
                prop_assert_eq!(status, RequestStatus::Delivered);
            }
        }

        /// Terminal statuses are absorbing under every action.
        #[test]
        fn prop_terminal_statuses_are_absorbing(action in action_strategy()) {
            for status in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
                prop_assert!(status.apply(action).is_err());
            }
        }
    }
}
