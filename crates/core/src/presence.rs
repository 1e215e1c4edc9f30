//! People present on a floor and the directory entries they resolve to.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Floor, Timestamp};

/// A person as reported by the booking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentPerson {
    /// Booking service user identifier.
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl PresentPerson {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Lower-cased email used as the directory join key.
    pub fn email_key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
    }
}

/// An active booking: who sits at which location today.
///
/// Read once per assignment run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// External id of the booked location.
    pub location_external_id: String,
    pub person: PresentPerson,
    pub floor: Floor,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
}

/// A directory entry. The engine only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Internal numeric identity used for task foreign keys.
    pub id: DbId,
    pub display_name: String,
    pub email: Option<String>,
    /// Chat handle; absent when the person is not reachable.
    pub messaging_handle: Option<String>,
}

/// A booking joined with the directory: the person occupying a location,
/// with their internal id when the directory knows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub location_external_id: String,
    pub person_external_id: String,
    pub person_id: Option<DbId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(email: Option<&str>) -> PresentPerson {
        PresentPerson {
            external_id: "u-1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn email_key_is_lowercased_and_trimmed() {
        assert_eq!(
            person(Some("  Ada@Example.COM ")).email_key().as_deref(),
            Some("ada@example.com")
        );
    }

    #[test]
    fn blank_email_has_no_key() {
        assert_eq!(person(Some("  ")).email_key(), None);
        assert_eq!(person(None).email_key(), None);
    }

    #[test]
    fn display_name_joins_first_and_last() {
        assert_eq!(person(None).display_name(), "Ada Lovelace");
    }
}
