use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Closed set of permission tiers. Stored as plain strings in the
/// database and in JWT claims; parsed into this enum at the request
/// boundary so every downstream check is exhaustive.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Role {
    Employee,
    Manager,
    #[strum(serialize = "APD")]
    #[serde(rename = "APD")]
    Apd,
    #[strum(serialize = "PD")]
    #[serde(rename = "PD")]
    Pd,
    #[strum(serialize = "MD")]
    #[serde(rename = "MD")]
    Md,
    #[strum(serialize = "HR")]
    #[serde(rename = "HR")]
    Hr,
    #[strum(serialize = "CA")]
    #[serde(rename = "CA")]
    Ca,
    #[strum(serialize = "CAP")]
    #[serde(rename = "CAP")]
    Cap,
}

/// Resolve a raw role name coming from a token or a DB row.
///
/// Unknown or missing names degrade to `Employee`-level visibility
/// instead of failing the request. This is the single fallback branch
/// for the whole crate; nothing else re-interprets role strings.
pub fn resolve_role(raw: Option<&str>) -> Role {
    raw.and_then(|s| s.parse::<Role>().ok())
        .unwrap_or(Role::Employee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_canonical_names() {
        assert_eq!("Employee".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("APD".parse::<Role>().unwrap(), Role::Apd);
        assert_eq!("PD".parse::<Role>().unwrap(), Role::Pd);
        assert_eq!("MD".parse::<Role>().unwrap(), Role::Md);
        assert_eq!("HR".parse::<Role>().unwrap(), Role::Hr);
        assert_eq!("CA".parse::<Role>().unwrap(), Role::Ca);
        assert_eq!("CAP".parse::<Role>().unwrap(), Role::Cap);
    }

    #[test]
    fn display_round_trips_every_role() {
        for role in Role::iter() {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_name_falls_back_to_employee() {
        assert_eq!(resolve_role(Some("Intern")), Role::Employee);
        assert_eq!(resolve_role(Some("")), Role::Employee);
        assert_eq!(resolve_role(None), Role::Employee);
    }

    #[test]
    fn known_name_does_not_fall_back() {
        assert_eq!(resolve_role(Some("MD")), Role::Md);
    }
}
