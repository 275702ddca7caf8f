use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::perm::hierarchy::{can_manage, subordinates_of};
use crate::perm::role::Role;

/// Lifecycle of a reviewed record (attendance entry, leave request,
/// salary request). `Pending` is the only mutable state; `Approved`
/// and `Rejected` are terminal, with no unlock path through the API.
/// Corrections require delete-while-Pending and recreation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
pub enum RecordStatus {
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pending",
            RecordStatus::Approved => "Approved",
            RecordStatus::Rejected => "Rejected",
        }
    }
}

/// Row-level actions a caller may attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RowAction {
    Edit,
    Approve,
    Reject,
    Delete,
}

/// Status-and-role gate for a row-level action.
///
/// Everything is locked once a record leaves `Pending`, for every role.
/// Approve/reject further require a role whose scope reaches beyond its
/// own tier; edit/delete stay open to the record's own submitter, so
/// the status check is the whole story for them here.
pub fn can_act(action: RowAction, status: RecordStatus, role: Role) -> bool {
    if status != RecordStatus::Pending {
        return false;
    }
    match action {
        RowAction::Edit | RowAction::Delete => true,
        RowAction::Approve | RowAction::Reject => {
            subordinates_of(role).iter().any(|r| *r != role)
        }
    }
}

/// A record as seen by the resolver: its status plus who submitted it.
#[derive(Debug, Copy, Clone)]
pub struct RecordRef<'a> {
    pub status: RecordStatus,
    pub owner_role: Role,
    pub owner_id: &'a str,
}

/// Inputs for one record-level decision. Constructed fresh per request
/// from the session and the fetched row; never persisted.
#[derive(Debug, Copy, Clone)]
pub struct PermissionContext<'a> {
    pub current_role: Role,
    pub current_employee_id: Option<&'a str>,
    pub record: Option<RecordRef<'a>>,
}

impl<'a> PermissionContext<'a> {
    pub fn new(current_role: Role, current_employee_id: Option<&'a str>) -> Self {
        Self {
            current_role,
            current_employee_id,
            record: None,
        }
    }

    pub fn with_record(mut self, record: RecordRef<'a>) -> Self {
        self.record = Some(record);
        self
    }

    /// Full record-level decision.
    ///
    /// Edit/delete: the caller must be the submitter or outrank the
    /// submitter's role. Approve/reject: the caller must outrank the
    /// submitter's role and must not be reviewing their own record.
    pub fn allows(&self, action: RowAction) -> bool {
        let Some(record) = self.record else {
            return false;
        };
        if !can_act(action, record.status, self.current_role) {
            return false;
        }

        let is_owner = self
            .current_employee_id
            .is_some_and(|id| id == record.owner_id);
        let outranks = can_manage(self.current_role, record.owner_role);

        match action {
            RowAction::Edit | RowAction::Delete => is_owner || outranks,
            RowAction::Approve | RowAction::Reject => outranks && !is_owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const ACTIONS: [RowAction; 4] = [
        RowAction::Edit,
        RowAction::Approve,
        RowAction::Reject,
        RowAction::Delete,
    ];

    #[test]
    fn terminal_states_lock_every_action_for_every_role() {
        for role in Role::iter() {
            for action in ACTIONS {
                assert!(!can_act(action, RecordStatus::Approved, role));
                assert!(!can_act(action, RecordStatus::Rejected, role));
            }
        }
    }

    #[test]
    fn manager_can_approve_pending_but_not_approved() {
        assert!(can_act(RowAction::Approve, RecordStatus::Pending, Role::Manager));
        assert!(!can_act(RowAction::Approve, RecordStatus::Approved, Role::Manager));
    }

    #[test]
    fn employee_never_approves() {
        assert!(!can_act(RowAction::Approve, RecordStatus::Pending, Role::Employee));
        assert!(!can_act(RowAction::Reject, RecordStatus::Pending, Role::Employee));
        // but may still edit or delete a pending record of their own
        assert!(can_act(RowAction::Edit, RecordStatus::Pending, Role::Employee));
        assert!(can_act(RowAction::Delete, RecordStatus::Pending, Role::Employee));
    }

    #[test]
    fn status_parses_from_db_strings() {
        assert_eq!("Pending".parse::<RecordStatus>().unwrap(), RecordStatus::Pending);
        assert_eq!("Approved".parse::<RecordStatus>().unwrap(), RecordStatus::Approved);
        assert!("Unknown".parse::<RecordStatus>().is_err());
    }

    fn pending_record(owner_role: Role, owner_id: &str) -> RecordRef<'_> {
        RecordRef {
            status: RecordStatus::Pending,
            owner_role,
            owner_id,
        }
    }

    #[test]
    fn manager_reviews_subordinate_record() {
        let ctx = PermissionContext::new(Role::Manager, Some("EM-MANAGER"))
            .with_record(pending_record(Role::Employee, "EM-WORKER"));
        assert!(ctx.allows(RowAction::Approve));
        assert!(ctx.allows(RowAction::Reject));
        assert!(ctx.allows(RowAction::Edit));
    }

    #[test]
    fn nobody_reviews_their_own_record() {
        let ctx = PermissionContext::new(Role::Pd, Some("EM-SELF"))
            .with_record(pending_record(Role::Pd, "EM-SELF"));
        assert!(!ctx.allows(RowAction::Approve));
        assert!(!ctx.allows(RowAction::Reject));
        // their own pending record is still editable and deletable
        assert!(ctx.allows(RowAction::Edit));
        assert!(ctx.allows(RowAction::Delete));
    }

    #[test]
    fn approval_needs_the_owner_role_in_scope() {
        // Manager's scope is {Employee}; a PD-owned record is out of reach.
        let ctx = PermissionContext::new(Role::Manager, Some("EM-MANAGER"))
            .with_record(pending_record(Role::Pd, "EM-DIRECTOR"));
        assert!(!ctx.allows(RowAction::Approve));
    }

    #[test]
    fn approved_record_is_locked_even_for_md() {
        let record = RecordRef {
            status: RecordStatus::Approved,
            owner_role: Role::Employee,
            owner_id: "EM-WORKER",
        };
        let ctx = PermissionContext::new(Role::Md, Some("EM-TOP")).with_record(record);
        for action in ACTIONS {
            assert!(!ctx.allows(action));
        }
    }

    #[test]
    fn no_record_no_decision() {
        let ctx = PermissionContext::new(Role::Md, Some("EM-TOP"));
        assert!(!ctx.allows(RowAction::Approve));
    }
}
