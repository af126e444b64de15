use std::fmt;

use uuid::Uuid;

/// Named in-memory collections, one per resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Schools,
    Users,
    Students,
    Teachers,
    Classes,
    Attendance,
    Assignments,
    Reports,
    Documents,
    Notifications,
    ChatMessages,
    Billing,
}

impl Collection {
    pub const ALL: [Collection; 12] = [
        Collection::Schools,
        Collection::Users,
        Collection::Students,
        Collection::Teachers,
        Collection::Classes,
        Collection::Attendance,
        Collection::Assignments,
        Collection::Reports,
        Collection::Documents,
        Collection::Notifications,
        Collection::ChatMessages,
        Collection::Billing,
    ];

    /// Wire name, as used in seed fixtures and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Schools => "schools",
            Collection::Users => "users",
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Classes => "classes",
            Collection::Attendance => "attendance",
            Collection::Assignments => "assignments",
            Collection::Reports => "reports",
            Collection::Documents => "documents",
            Collection::Notifications => "notifications",
            Collection::ChatMessages => "chatMessages",
            Collection::Billing => "billing",
        }
    }

    /// Singular prefix for generated ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Collection::Schools => "school",
            Collection::Users => "user",
            Collection::Students => "student",
            Collection::Teachers => "teacher",
            Collection::Classes => "class",
            Collection::Attendance => "attendance",
            Collection::Assignments => "assignment",
            Collection::Reports => "report",
            Collection::Documents => "document",
            Collection::Notifications => "notification",
            Collection::ChatMessages => "chat",
            Collection::Billing => "billing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// `<prefix>-<32 hex chars>`
    pub fn generate_id(&self) -> String {
        format!("{}-{}", self.id_prefix(), Uuid::new_v4().simple())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_hex() {
        let id = Collection::Students.generate_id();
        let hex = id.strip_prefix("student-").unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_name(collection.name()), Some(collection));
        }
        assert_eq!(Collection::from_name("submissions"), None);
    }
}
