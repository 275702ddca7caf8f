use crate::perm::role::Role;

/// Subordinate scope of each role: the roles whose employees it may
/// search, onboard, issue passwords for, or review.
///
/// The sets are enumerated verbatim, not derived transitively. MD's
/// scope is typed out in full rather than computed from PD's entry,
/// matching the flat authority model of the organization.
pub fn subordinates_of(role: Role) -> &'static [Role] {
    match role {
        Role::Employee => &[Role::Employee],
        Role::Manager => &[Role::Employee],
        Role::Apd => &[Role::Manager, Role::Employee, Role::Ca, Role::Cap],
        Role::Hr => &[Role::Manager, Role::Employee, Role::Ca, Role::Cap],
        Role::Ca => &[Role::Manager, Role::Employee],
        Role::Cap => &[Role::Manager, Role::Employee],
        Role::Pd => &[Role::Apd, Role::Manager, Role::Employee, Role::Ca, Role::Cap],
        Role::Md => &[
            Role::Pd,
            Role::Apd,
            Role::Manager,
            Role::Employee,
            Role::Ca,
            Role::Cap,
        ],
    }
}

/// True when `actor` may act on employees holding `target`.
pub fn can_manage(actor: Role, target: Role) -> bool {
    subordinates_of(actor).contains(&target)
}

/// Roles an employee of `target` role may report to. Used when
/// onboarding to constrain the manager dropdown.
pub fn manager_roles_for(target: Role) -> &'static [Role] {
    match target {
        Role::Employee => &[Role::Manager, Role::Pd, Role::Apd],
        Role::Manager => &[Role::Pd, Role::Apd],
        Role::Apd => &[Role::Pd, Role::Md],
        Role::Pd => &[Role::Md],
        Role::Md => &[],
        Role::Hr | Role::Ca | Role::Cap => &[Role::Pd, Role::Md],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_role_has_a_scope() {
        for role in Role::iter() {
            // Empty would mean the role can see nobody at all, which no
            // entry in the table allows today.
            assert!(!subordinates_of(role).is_empty(), "{role} has no entry");
        }
    }

    #[test]
    fn md_scope_is_broadest_but_excludes_itself() {
        let scope = subordinates_of(Role::Md);
        for role in [Role::Pd, Role::Apd, Role::Manager, Role::Employee, Role::Ca, Role::Cap] {
            assert!(scope.contains(&role));
        }
        assert!(!scope.contains(&Role::Md));
    }

    #[test]
    fn scopes_are_flat_not_transitive() {
        // PD manages APD, and APD manages CA/CAP, but PD's own entry is
        // taken verbatim: it lists CA/CAP explicitly, while Manager's
        // entry stays at just Employee even though Employee "manages"
        // its own tier.
        assert!(subordinates_of(Role::Pd).contains(&Role::Ca));
        assert_eq!(subordinates_of(Role::Manager), &[Role::Employee]);
    }

    #[test]
    fn nobody_manages_md() {
        for role in Role::iter() {
            assert!(!can_manage(role, Role::Md));
        }
    }

    #[test]
    fn manager_cannot_act_upward() {
        assert!(can_manage(Role::Manager, Role::Employee));
        assert!(!can_manage(Role::Employee, Role::Manager));
        assert!(!can_manage(Role::Manager, Role::Pd));
    }

    #[test]
    fn md_reports_to_nobody() {
        assert!(manager_roles_for(Role::Md).is_empty());
        assert_eq!(manager_roles_for(Role::Pd), &[Role::Md]);
    }
}
