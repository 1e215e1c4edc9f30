//! Joining bookings with the directory.

use std::collections::HashMap;

use sprout_core::error::EngineError;
use sprout_core::ports::{DirectorySource, HandleLookup};
use sprout_core::presence::{Booking, Occupant, Person, PresentPerson};

/// Register everyone found in `bookings`, re-read the directory so new
/// entries resolve, and fill in missing messaging handles.
///
/// Returns one occupant per booking, in booking order.
pub async fn resolve_occupants(
    directory: &dyn DirectorySource,
    handles: Option<&dyn HandleLookup>,
    bookings: &[Booking],
) -> Result<Vec<Occupant>, EngineError> {
    if bookings.is_empty() {
        return Ok(Vec::new());
    }

    let mut people: Vec<PresentPerson> = Vec::new();
    for booking in bookings {
        if !people.iter().any(|p| p.external_id == booking.person.external_id) {
            people.push(booking.person.clone());
        }
    }

    let created = directory
        .register(&people)
        .await
        .map_err(|e| EngineError::SourceUnavailable(e.to_string()))?;
    if created > 0 {
        tracing::info!(created, "Registered new people from bookings");
    }

    let mut emails: Vec<String> = people.iter().filter_map(PresentPerson::email_key).collect();
    emails.sort();
    emails.dedup();

    let resolved = directory
        .resolve_by_email(&emails)
        .await
        .map_err(|e| EngineError::SourceUnavailable(e.to_string()))?;

    let mut by_email: HashMap<String, Person> = resolved
        .into_iter()
        .filter_map(|p| Some((p.email.as_deref()?.trim().to_lowercase(), p)))
        .collect();

    if let Some(lookup) = handles {
        fill_missing_handles(directory, lookup, &mut by_email).await;
    }

    let occupants = bookings
        .iter()
        .map(|booking| {
            let person_id = booking
                .person
                .email_key()
                .and_then(|email| by_email.get(&email))
                .map(|p| p.id);
            if person_id.is_none() {
                tracing::debug!(
                    person = %booking.person.external_id,
                    location = %booking.location_external_id,
                    "Booking person not in directory",
                );
            }
            Occupant {
                location_external_id: booking.location_external_id.clone(),
                person_external_id: booking.person.external_id.clone(),
                person_id,
            }
        })
        .collect();

    Ok(occupants)
}

/// Look up and store handles for directory entries that have none.
/// Failures only leave the handle missing.
async fn fill_missing_handles(
    directory: &dyn DirectorySource,
    lookup: &dyn HandleLookup,
    by_email: &mut HashMap<String, Person>,
) {
    for (email, person) in by_email.iter_mut() {
        if person.messaging_handle.is_some() {
            continue;
        }
        match lookup.lookup_handle(email).await {
            Ok(Some(handle)) => {
                if let Err(e) = directory.set_messaging_handle(person.id, &handle).await {
                    tracing::warn!(person_id = person.id, error = %e, "Failed to store handle");
                    continue;
                }
                tracing::debug!(person_id = person.id, "Messaging handle resolved");
                person.messaging_handle = Some(handle);
            }
            Ok(None) => tracing::debug!(person_id = person.id, "No chat account for person"),
            Err(e) => tracing::warn!(person_id = person.id, error = %e, "Handle lookup failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{booking, MemoryDirectory, MemoryHandles};

    #[tokio::test]
    async fn new_people_are_registered_then_resolved() {
        let directory = MemoryDirectory::default();
        let bookings = vec![
            booking("desk-1", "u1", Some("Ada@X.io"), 1),
            booking("desk-2", "u2", Some("alan@x.io"), 1),
            booking("desk-3", "u3", None, 1),
        ];

        let occupants = resolve_occupants(&directory, None, &bookings).await.unwrap();
        assert_eq!(occupants.len(), 3);
        assert!(occupants[0].person_id.is_some());
        assert!(occupants[1].person_id.is_some());
        assert_ne!(occupants[0].person_id, occupants[1].person_id);
        assert_eq!(occupants[2].person_id, None);
        assert_eq!(directory.len(), 2);
    }

    #[tokio::test]
    async fn same_person_twice_registers_once() {
        let directory = MemoryDirectory::default();
        let bookings = vec![
            booking("desk-1", "u1", Some("ada@x.io"), 1),
            booking("desk-2", "u1", Some("ada@x.io"), 1),
        ];
        let occupants = resolve_occupants(&directory, None, &bookings).await.unwrap();
        assert_eq!(occupants[0].person_id, occupants[1].person_id);
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn missing_handles_are_looked_up_and_stored() {
        let directory = MemoryDirectory::default();
        let handles = MemoryHandles::new([("ada@x.io", "U-ADA")]);
        let bookings = vec![
            booking("desk-1", "u1", Some("ada@x.io"), 1),
            booking("desk-2", "u2", Some("ghost@x.io"), 1),
        ];

        let occupants = resolve_occupants(&directory, Some(&handles), &bookings)
            .await
            .unwrap();
        let ada = directory.find(occupants[0].person_id.unwrap()).unwrap();
        assert_eq!(ada.messaging_handle.as_deref(), Some("U-ADA"));
        let ghost = directory.find(occupants[1].person_id.unwrap()).unwrap();
        assert_eq!(ghost.messaging_handle, None);
    }

    #[tokio::test]
    async fn directory_failure_is_source_unavailable() {
        let directory = MemoryDirectory::default();
        directory.fail();
        let err = resolve_occupants(&directory, None, &[booking("d", "u", Some("a@x.io"), 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable(_)));
    }
}
