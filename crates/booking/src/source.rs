//! Port adapters over [`BookingApi`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sprout_core::location::{centroid, LocationUpsert};
use sprout_core::ports::{PortError, PortResult, PresenceSource, ResourceSource};
use sprout_core::presence::{Booking, PresentPerson};
use sprout_core::types::{Floor, Timestamp};

use crate::api::{BookingApi, BookingApiError};
use crate::config::BookingConfig;
use crate::messages::UserRecord;

fn source_error(err: BookingApiError) -> PortError {
    PortError::Source(err.to_string())
}

fn parse_time(raw: Option<&str>) -> Option<Timestamp> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Presence and floor resources read from the booking service.
#[derive(Clone)]
pub struct BookingSource {
    api: BookingApi,
    floor_ids: BTreeMap<Floor, String>,
    room_ids: BTreeMap<Floor, String>,
}

impl BookingSource {
    pub fn new(api: BookingApi, config: &BookingConfig) -> Self {
        Self {
            api,
            floor_ids: config.floor_ids.clone(),
            room_ids: config.room_ids.clone(),
        }
    }

    /// Fetch user details one by one. A failed lookup drops that user
    /// only.
    async fn fetch_users(&self, user_ids: &[&str]) -> HashMap<String, UserRecord> {
        let mut users = HashMap::new();
        for &user_id in user_ids {
            match self.api.get_user(user_id).await {
                Ok(Some(user)) => {
                    users.insert(user_id.to_string(), user);
                }
                Ok(None) => tracing::debug!(user_id, "Booking user not found"),
                Err(e) => tracing::warn!(user_id, error = %e, "Failed to fetch booking user"),
            }
        }
        users
    }
}

#[async_trait]
impl PresenceSource for BookingSource {
    async fn bookings_for_floor(&self, floor: Floor) -> PortResult<Vec<Booking>> {
        let floor_id = self
            .floor_ids
            .get(&floor)
            .ok_or_else(|| PortError::Source(format!("no booking floor id for floor {floor}")))?;

        let today = Utc::now().date_naive();
        let records = self
            .api
            .list_bookings(floor_id, today)
            .await
            .map_err(source_error)?;

        let mut user_ids: Vec<&str> = records
            .iter()
            .filter_map(|r| r.resource_and_user().map(|(_, user)| user))
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let users = self.fetch_users(&user_ids).await;

        let bookings: Vec<Booking> = records
            .iter()
            .filter_map(|record| {
                let (resource_id, user_id) = record.resource_and_user()?;
                let user = users.get(user_id)?;
                Some(Booking {
                    location_external_id: resource_id.to_string(),
                    person: PresentPerson {
                        external_id: user.id.clone(),
                        first_name: user.first_name.clone(),
                        last_name: user.last_name.clone(),
                        email: user.email.clone(),
                    },
                    floor,
                    starts_at: parse_time(record.booking_start_date_time.as_deref()),
                    ends_at: parse_time(record.booking_end_date_time.as_deref()),
                })
            })
            .collect();

        tracing::debug!(
            floor,
            records = records.len(),
            bookings = bookings.len(),
            "Fetched bookings",
        );
        Ok(bookings)
    }
}

#[async_trait]
impl ResourceSource for BookingSource {
    fn floors(&self) -> Vec<Floor> {
        self.room_ids.keys().copied().collect()
    }

    async fn resources_for_floor(&self, floor: Floor) -> PortResult<Vec<LocationUpsert>> {
        let room_id = self
            .room_ids
            .get(&floor)
            .ok_or_else(|| PortError::Source(format!("no booking room id for floor {floor}")))?;

        let room = self.api.get_room(room_id).await.map_err(source_error)?;

        let resources = room
            .resources
            .into_iter()
            .filter_map(|resource| match centroid(&resource.vertices) {
                Some((x, y)) => Some(LocationUpsert {
                    external_id: resource.id,
                    name: resource.name,
                    x,
                    y,
                    floor,
                }),
                None => {
                    tracing::debug!(resource_id = %resource.id, "Skipping resource without vertices");
                    None
                }
            })
            .collect();
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn list_bookings(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        assert_eq!(params.get("floor").map(String::as_str), Some("floor-1"));
        assert_eq!(params.get("location").map(String::as_str), Some("site-1"));
        Json(json!({
            "status": "success",
            "data": [
                {"user": {"id": "u-1"}, "resource": {"id": "desk-1"},
                 "bookingStartDateTime": "2025-06-02T08:00:00+02:00"},
                {"user": {"id": "u-2"}, "resource": {"id": "desk-2"}},
                {"user": {"id": "u-404"}, "resource": {"id": "desk-3"}},
                {"resource": {"id": "desk-4"}}
            ]
        }))
    }

    async fn get_user(Path(id): Path<String>) -> axum::response::Response {
        match id.as_str() {
            "u-1" => Json(json!({"status": "success", "data":
                {"id": "u-1", "firstName": "Ada", "lastName": "Lovelace", "email": "Ada@X.io"}}))
            .into_response(),
            "u-2" => Json(json!({"status": "success", "data":
                {"id": "u-2", "firstName": "Alan", "lastName": "Turing"}}))
            .into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn get_room(Path(id): Path<String>) -> axum::response::Response {
        if id != "room-1" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        Json(json!({
            "status": "success",
            "data": {"id": "room-1", "resources": [
                {"id": "desk-1", "name": "Desk 1", "vertices": [[0, 0], [4, 0], [4, 2], [0, 2]]},
                {"id": "desk-2", "name": "Desk 2", "vertices": []}
            ]}
        }))
        .into_response()
    }

    async fn source() -> BookingSource {
        let app = Router::new()
            .route("/resourceBooking/list", get(list_bookings))
            .route("/user/{id}", get(get_user))
            .route("/room/{id}", get(get_room));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = BookingConfig {
            api_url: format!("http://{addr}"),
            api_key: "key".into(),
            location_id: "site-1".into(),
            floor_ids: [(1, "floor-1".to_string())].into_iter().collect(),
            room_ids: [(1, "room-1".to_string()), (2, "room-2".to_string())]
                .into_iter()
                .collect(),
        };
        BookingSource::new(BookingApi::new(&config).unwrap(), &config)
    }

    #[tokio::test]
    async fn bookings_join_users_and_drop_unknown() {
        let source = source().await;
        let bookings = source.bookings_for_floor(1).await.unwrap();

        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].location_external_id, "desk-1");
        assert_eq!(bookings[0].person.email_key().as_deref(), Some("ada@x.io"));
        assert_eq!(bookings[0].floor, 1);
        assert!(bookings[0].starts_at.is_some());
        assert_eq!(bookings[1].person.display_name(), "Alan Turing");
        assert_eq!(bookings[1].person.email, None);
    }

    #[tokio::test]
    async fn unknown_floor_is_a_source_error() {
        let source = source().await;
        let err = source.bookings_for_floor(9).await.unwrap_err();
        assert!(matches!(err, PortError::Source(_)));
    }

    #[tokio::test]
    async fn resources_become_centroids() {
        let source = source().await;
        assert_eq!(source.floors(), vec![1, 2]);

        let resources = source.resources_for_floor(1).await.unwrap();
        assert_eq!(
            resources,
            vec![LocationUpsert {
                external_id: "desk-1".into(),
                name: "Desk 1".into(),
                x: 2.0,
                y: 1.0,
                floor: 1,
            }]
        );
    }

    #[tokio::test]
    async fn http_failure_is_a_source_error() {
        let source = source().await;
        let err = source.resources_for_floor(2).await.unwrap_err();
        assert!(matches!(err, PortError::Source(msg) if msg.contains("500")));
    }
}
