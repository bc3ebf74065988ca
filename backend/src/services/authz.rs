//! Authorization policy
//!
//! Single policy point consulted by every outward-facing operation. The
//! individual role checks live as predicates on [`Actor`]; this module maps
//! an (actor, action) pair to allow or deny.

use shared::{Actor, Recipient, RequestAction, TransferRequest};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Everything an actor can attempt against the core
#[derive(Debug)]
pub enum StockAction<'a> {
    /// Submit a movement batch
    PostMovements,
    /// Delete a recent movement with inverse effect
    ReverseMovement,
    /// Open a transfer request on behalf of a branch
    CreateRequest { branch_id: Uuid },
    /// Accept/reject/deliver/cancel an existing request
    RespondRequest {
        request: &'a TransferRequest,
        action: RequestAction,
    },
    /// Create or mutate products, categories, branches, dealers
    ManageCatalog,
    /// Read or mark a recipient's notification feed
    ReadNotifications { recipient: Recipient },
}

/// Allow or deny an action for an actor. Deny is always `Unauthorized`;
/// callers surface it before touching any state.
pub fn authorize(actor: &Actor, action: StockAction<'_>) -> AppResult<()> {
    let allowed = match action {
        StockAction::PostMovements => true,
        StockAction::ReverseMovement => actor.is_admin(),
        StockAction::ManageCatalog => actor.is_admin(),
        StockAction::CreateRequest { branch_id } => {
            actor.is_admin() || actor.belongs_to_branch(branch_id)
        }
        StockAction::RespondRequest { request, action } => match action {
            // Only the original requester may cancel
            RequestAction::Cancel => request.requested_by == actor.id,
            RequestAction::Accept | RequestAction::Reject | RequestAction::Deliver => {
                actor.is_admin()
                    || request
                        .source
                        .branch_id()
                        .is_some_and(|source| actor.manages_branch(source))
            }
        },
        StockAction::ReadNotifications { recipient } => match recipient {
            Recipient::Admins => actor.is_admin(),
            Recipient::Branch(branch_id) => {
                actor.is_admin() || actor.belongs_to_branch(branch_id)
            }
        },
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "Actor {} ({}) may not perform this action",
            actor.id,
            actor.role.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{Location, RequestStatus, Role};

    fn actor(role: Role, branch_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            branch_id,
        }
    }

    fn pending_request(requesting_branch: Uuid, source: Location, requested_by: Uuid) -> TransferRequest {
        TransferRequest {
            id: Uuid::new_v4(),
            requesting_branch_id: requesting_branch,
            product_id: Uuid::new_v4(),
            quantity: 5,
            source,
            status: RequestStatus::Pending,
            requested_by,
            requested_at: Utc::now(),
            responded_by: None,
            responded_at: None,
            request_notes: None,
            response_notes: None,
        }
    }

    #[test]
    fn reversal_and_catalog_are_admin_only() {
        let admin = actor(Role::Admin, None);
        let manager = actor(Role::BranchManager, Some(Uuid::new_v4()));
        let employee = actor(Role::BranchEmployee, Some(Uuid::new_v4()));

        assert!(authorize(&admin, StockAction::ReverseMovement).is_ok());
        assert!(authorize(&manager, StockAction::ReverseMovement).is_err());
        assert!(authorize(&employee, StockAction::ReverseMovement).is_err());

        assert!(authorize(&admin, StockAction::ManageCatalog).is_ok());
        assert!(authorize(&manager, StockAction::ManageCatalog).is_err());
    }

    #[test]
    fn requests_are_created_for_the_actor_own_branch() {
        let branch = Uuid::new_v4();
        let member = actor(Role::BranchEmployee, Some(branch));

        assert!(authorize(&member, StockAction::CreateRequest { branch_id: branch }).is_ok());
        assert!(authorize(
            &member,
            StockAction::CreateRequest {
                branch_id: Uuid::new_v4()
            }
        )
        .is_err());
        assert!(authorize(
            &actor(Role::Admin, None),
            StockAction::CreateRequest { branch_id: branch }
        )
        .is_ok());
    }

    #[test]
    fn only_the_requester_may_cancel() {
        let branch = Uuid::new_v4();
        let requester = actor(Role::BranchEmployee, Some(branch));
        let request = pending_request(branch, Location::Warehouse, requester.id);

        assert!(authorize(
            &requester,
            StockAction::RespondRequest {
                request: &request,
                action: RequestAction::Cancel,
            }
        )
        .is_ok());

        // Not even an admin can cancel on the requester's behalf
        assert!(authorize(
            &actor(Role::Admin, None),
            StockAction::RespondRequest {
                request: &request,
                action: RequestAction::Cancel,
            }
        )
        .is_err());
    }

    #[test]
    fn accept_requires_admin_or_source_branch_manager() {
        let source_branch = Uuid::new_v4();
        let request = pending_request(
            Uuid::new_v4(),
            Location::Branch { id: source_branch },
            Uuid::new_v4(),
        );
        let accept = |who: &Actor| {
            authorize(
                who,
                StockAction::RespondRequest {
                    request: &request,
                    action: RequestAction::Accept,
                },
            )
        };

        assert!(accept(&actor(Role::Admin, None)).is_ok());
        assert!(accept(&actor(Role::BranchManager, Some(source_branch))).is_ok());
        assert!(accept(&actor(Role::BranchManager, Some(Uuid::new_v4()))).is_err());
        assert!(accept(&actor(Role::BranchEmployee, Some(source_branch))).is_err());
    }

    #[test]
    fn warehouse_sourced_requests_are_answered_by_admins_only() {
        let request = pending_request(Uuid::new_v4(), Location::Warehouse, Uuid::new_v4());
        let manager = actor(Role::BranchManager, Some(Uuid::new_v4()));

        assert!(authorize(
            &manager,
            StockAction::RespondRequest {
                request: &request,
                action: RequestAction::Accept,
            }
        )
        .is_err());
        assert!(authorize(
            &actor(Role::Admin, None),
            StockAction::RespondRequest {
                request: &request,
                action: RequestAction::Reject,
            }
        )
        .is_ok());
    }

    #[test]
    fn notification_feeds_are_private_to_their_recipient() {
        let branch = Uuid::new_v4();
        let member = actor(Role::BranchEmployee, Some(branch));
        let admin = actor(Role::Admin, None);

        assert!(authorize(
            &member,
            StockAction::ReadNotifications {
                recipient: Recipient::Branch(branch)
            }
        )
        .is_ok());
        assert!(authorize(
            &member,
            StockAction::ReadNotifications {
                recipient: Recipient::Branch(Uuid::new_v4())
            }
        )
        .is_err());
        assert!(authorize(
            &member,
            StockAction::ReadNotifications {
                recipient: Recipient::Admins
            }
        )
        .is_err());
        assert!(authorize(
            &admin,
            StockAction::ReadNotifications {
                recipient: Recipient::Admins
            }
        )
        .is_ok());
        assert!(authorize(
            &admin,
            StockAction::ReadNotifications {
                recipient: Recipient::Branch(branch)
            }
        )
        .is_ok());
    }
}
