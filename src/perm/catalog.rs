use crate::perm::role::Role;

/// Roles allowed to see a catalog entry.
#[derive(Debug, Clone, Copy)]
pub enum Allowed {
    All,
    Roles(&'static [Role]),
}

impl Allowed {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Allowed::All => true,
            Allowed::Roles(roles) => roles.contains(&role),
        }
    }
}

/// One navigable feature of the application. Built once at compile
/// time; the catalog order is the display order and is never resorted.
#[derive(Debug)]
pub struct ActionDescriptor {
    pub label: &'static str,
    pub route: &'static str,
    pub allowed: Allowed,
}

const SALARY_ROLES: &[Role] = &[Role::Md, Role::Pd];
const AUDIT_ROLES: &[Role] = &[Role::Md, Role::Pd];
const ALL_EMPLOYEE_DATA_ROLES: &[Role] = &[Role::Md, Role::Pd];

pub const ACTION_CATALOG: &[ActionDescriptor] = &[
    ActionDescriptor {
        label: "Add/Update Attendance",
        route: "/attendanceupdate",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Add/Update Leave",
        route: "/leaveupdate",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Show Employee",
        route: "/showemployee",
        allowed: Allowed::Roles(ALL_EMPLOYEE_DATA_ROLES),
    },
    ActionDescriptor {
        label: "Onboarding Employee",
        route: "/onboardingemployee",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Create Temporary Password",
        route: "/createpassword",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Update Employee Details",
        route: "/inprogress",
        allowed: Allowed::Roles(ALL_EMPLOYEE_DATA_ROLES),
    },
    ActionDescriptor {
        label: "Calculate or Generate Salary",
        route: "/calculateorgeneratesalary",
        allowed: Allowed::Roles(SALARY_ROLES),
    },
    ActionDescriptor {
        label: "Withdraw Advanced Salary",
        route: "/withdrawadvancedsalary",
        allowed: Allowed::Roles(SALARY_ROLES),
    },
    ActionDescriptor {
        label: "Assign Project",
        route: "/inprogress",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Add Project",
        route: "/inprogress",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Update Progress Project",
        route: "/inprogress",
        allowed: Allowed::All,
    },
    ActionDescriptor {
        label: "Audit Log",
        route: "/auditlog",
        allowed: Allowed::Roles(AUDIT_ROLES),
    },
];

/// Filter the catalog down to what `role` may see, preserving catalog
/// order. Pure and side-effect free.
pub fn visible_actions<'a>(
    role: Role,
    catalog: &'a [ActionDescriptor],
) -> Vec<&'a ActionDescriptor> {
    catalog
        .iter()
        .filter(|action| action.allowed.permits(role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(actions: &[&ActionDescriptor]) -> Vec<&'static str> {
        actions.iter().map(|a| a.label).collect()
    }

    #[test]
    fn employee_sees_only_unrestricted_entries() {
        let visible = visible_actions(Role::Employee, ACTION_CATALOG);
        let labels = labels(&visible);
        assert!(labels.contains(&"Add/Update Attendance"));
        assert!(labels.contains(&"Add/Update Leave"));
        assert!(!labels.contains(&"Audit Log"));
        assert!(!labels.contains(&"Calculate or Generate Salary"));
        assert!(!labels.contains(&"Show Employee"));
    }

    #[test]
    fn md_sees_the_full_catalog() {
        assert_eq!(
            visible_actions(Role::Md, ACTION_CATALOG).len(),
            ACTION_CATALOG.len()
        );
    }

    #[test]
    fn catalog_order_is_preserved() {
        let visible = visible_actions(Role::Pd, ACTION_CATALOG);
        let mut last_index = 0;
        for action in visible {
            let index = ACTION_CATALOG
                .iter()
                .position(|a| std::ptr::eq(a, action))
                .unwrap();
            assert!(index >= last_index);
            last_index = index;
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = visible_actions(Role::Manager, ACTION_CATALOG);
        let twice: Vec<_> = once
            .iter()
            .filter(|a| a.allowed.permits(Role::Manager))
            .copied()
            .collect();
        assert_eq!(labels(&once), labels(&twice));
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let first = labels(&visible_actions(Role::Hr, ACTION_CATALOG));
        let second = labels(&visible_actions(Role::Hr, ACTION_CATALOG));
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_role_gets_employee_level_menu() {
        use crate::perm::role::resolve_role;

        let as_intern = labels(&visible_actions(resolve_role(Some("Intern")), ACTION_CATALOG));
        let as_employee = labels(&visible_actions(Role::Employee, ACTION_CATALOG));
        assert_eq!(as_intern, as_employee);
    }

    #[test]
    fn restricted_scenario_from_menu() {
        // Audit Log is MD/PD only; attendance is open to everyone.
        let catalog = [
            ActionDescriptor {
                label: "Audit Log",
                route: "/auditlog",
                allowed: Allowed::Roles(&[Role::Md, Role::Pd]),
            },
            ActionDescriptor {
                label: "Add/Update Attendance",
                route: "/attendanceupdate",
                allowed: Allowed::All,
            },
        ];
        let visible = visible_actions(Role::Employee, &catalog);
        assert_eq!(labels(&visible), vec!["Add/Update Attendance"]);
    }
}
