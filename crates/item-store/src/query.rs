use common::Item;

/// Criteria for narrowing an item listing.
///
/// Blank values are treated as absent, so a filter built straight from
/// query-string parameters like `?name=&email_address=` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Exact display name.
    pub name: Option<String>,

    /// Exact contact e-mail address.
    pub email_address: Option<String>,
}

impl ItemFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching a display name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Creates a filter matching an e-mail address.
    pub fn by_email_address(email_address: impl Into<String>) -> Self {
        Self {
            email_address: Some(email_address.into()),
            ..Default::default()
        }
    }

    /// Adds a display-name criterion.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an e-mail criterion.
    pub fn with_email_address(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = Some(email_address.into());
        self
    }

    /// Returns the name criterion, ignoring blanks.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Returns the e-mail criterion, ignoring blanks.
    pub fn email_address(&self) -> Option<&str> {
        non_blank(self.email_address.as_deref())
    }

    /// Returns true if no effective criterion is set.
    pub fn is_empty(&self) -> bool {
        self.name().is_none() && self.email_address().is_none()
    }

    /// Checks whether an item satisfies every effective criterion.
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(name) = self.name()
            && item.name != name
        {
            return false;
        }
        if let Some(email) = self.email_address()
            && item.email_address != email
        {
            return false;
        }
        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{ItemId, Role};

    use super::*;

    fn item(name: &str, email: &str) -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::new(1),
            name: name.to_string(),
            email_address: email.to_string(),
            external_user_id: Some("ext-1".to_string()),
            role: Role::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ItemFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&item("A", "a@example.com")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let filter = ItemFilter::by_name("  ").with_email_address("");
        assert!(filter.is_empty());
        assert!(filter.matches(&item("A", "a@example.com")));
    }

    #[test]
    fn all_criteria_must_match() {
        let filter = ItemFilter::by_name("A").with_email_address("a@example.com");
        assert!(filter.matches(&item("A", "a@example.com")));
        assert!(!filter.matches(&item("A", "b@example.com")));
        assert!(!filter.matches(&item("B", "a@example.com")));
    }
}
