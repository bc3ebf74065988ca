//! Actor model
//!
//! Identity and role resolution happen outside the core; every call arrives
//! with an already-resolved actor. The predicates here are the building
//! blocks of the authorization policy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

/// The resolved identity behind a call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// Branch the actor belongs to; admins have none
    pub branch_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_branch_manager(&self) -> bool {
        self.role == Role::BranchManager
    }

    pub fn is_branch_user(&self) -> bool {
        matches!(self.role, Role::BranchManager | Role::BranchEmployee)
    }

    /// Member (manager or employee) of the given branch
    pub fn belongs_to_branch(&self, branch_id: Uuid) -> bool {
        self.is_branch_user() && self.branch_id == Some(branch_id)
    }

    /// Manager of the given branch specifically
    pub fn manages_branch(&self, branch_id: Uuid) -> bool {
        self.is_branch_manager() && self.branch_id == Some(branch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_predicates_require_matching_branch() {
        let branch = Uuid::new_v4();
        let manager = Actor {
            id: Uuid::new_v4(),
            role: Role::BranchManager,
            branch_id: Some(branch),
        };
        assert!(manager.manages_branch(branch));
        assert!(manager.belongs_to_branch(branch));
        assert!(!manager.manages_branch(Uuid::new_v4()));

        let employee = Actor {
            id: Uuid::new_v4(),
            role: Role::BranchEmployee,
            branch_id: Some(branch),
        };
        assert!(employee.belongs_to_branch(branch));
        assert!(!employee.manages_branch(branch));
    }

    #[test]
    fn admin_has_no_branch_membership() {
        let admin = Actor {
            id: Uuid::new_v4(),
            role: Role::Admin,
            branch_id: None,
        };
        assert!(admin.is_admin());
        assert!(!admin.belongs_to_branch(Uuid::new_v4()));
    }
}
