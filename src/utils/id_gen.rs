use chrono::Local;
use uuid::Uuid;

/// Entities that get generated, prefixed ids.
#[derive(Debug, Copy, Clone)]
pub enum EntityKind {
    Employee,
    Attendance,
    Leave,
    Project,
    Audit,
}

impl EntityKind {
    fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Employee => "EM",
            EntityKind::Attendance => "AT",
            EntityKind::Leave => "LV",
            EntityKind::Project => "PJ",
            EntityKind::Audit => "AU",
        }
    }
}

/// Globally unique, non-sequential id with prefix.
/// Format: `<PREFIX>-<UUID fragment>-<YYMMDD>`, e.g. `EM-7F3A8C21C9-251006`.
pub fn generate_unique_id(kind: EntityKind) -> String {
    let hex = Uuid::new_v4().to_simple().to_string().to_uppercase();
    let date_part = Local::now().format("%y%m%d");
    format!("{}-{}-{}", kind.prefix(), &hex[..10], date_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_carries_prefix_and_fragment() {
        let id = generate_unique_id(EntityKind::Employee);
        assert!(id.starts_with("EM-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 10);
        assert_eq!(parts[2].len(), 6);
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_unique_id(EntityKind::Leave);
        let b = generate_unique_id(EntityKind::Leave);
        assert_ne!(a, b);
        assert!(a.starts_with("LV-"));
    }
}
