//! Named steps of the create and delete sequences.

/// A single step of an item create or delete.
///
/// Create runs:
/// ```text
/// absent ──CreateUser──► external-created ──PersistItem──► persisted
///        ──SetClaims──► claims-set ──Commit──► complete
/// ```
/// Delete runs:
/// ```text
/// complete ──LookupItem──► ──DeleteUser──► external-deleted ──DeleteItem──► ──Commit──► absent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Begin,
    CreateUser,
    PersistItem,
    SetClaims,
    LookupItem,
    DeleteUser,
    DeleteItem,
    Commit,
}

impl Step {
    /// Returns the step name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Begin => "begin",
            Step::CreateUser => "create_user",
            Step::PersistItem => "persist_item",
            Step::SetClaims => "set_claims",
            Step::LookupItem => "lookup_item",
            Step::DeleteUser => "delete_user",
            Step::DeleteItem => "delete_item",
            Step::Commit => "commit",
        }
    }

    /// Returns true if a failure at this create step leaves an external user
    /// behind that has to be deleted.
    pub fn orphans_external_user(&self) -> bool {
        matches!(self, Step::PersistItem | Step::SetClaims | Step::Commit)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_steps_after_create_user_orphan() {
        assert!(!Step::Begin.orphans_external_user());
        assert!(!Step::CreateUser.orphans_external_user());
        assert!(Step::PersistItem.orphans_external_user());
        assert!(Step::SetClaims.orphans_external_user());
        assert!(Step::Commit.orphans_external_user());
        assert!(!Step::DeleteUser.orphans_external_user());
    }

    #[test]
    fn test_display() {
        assert_eq!(Step::CreateUser.to_string(), "create_user");
        assert_eq!(Step::PersistItem.to_string(), "persist_item");
        assert_eq!(Step::SetClaims.to_string(), "set_claims");
    }
}
