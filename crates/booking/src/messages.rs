//! Wire types of the booking service's JSON API.
//!
//! Every response is wrapped as `{"status": "success", "data": ...}`.
//! A `status` other than `success` is treated as a failed call even when
//! the HTTP status is 2xx.

use serde::Deserialize;

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// The payload of a successful response.
    pub fn into_data(self) -> Option<T> {
        if self.is_success() {
            self.data
        } else {
            None
        }
    }
}

/// `{id, name}` reference used for resources, floors and sites.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: Option<String>,
}

/// A user reference embedded in a booking. Only `id` is guaranteed.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: Option<String>,
}

/// One entry of `GET /resourceBooking/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub user: Option<UserRef>,
    pub resource: Option<NamedRef>,
    pub floor: Option<NamedRef>,
    pub booking_start_date_time: Option<String>,
    pub booking_end_date_time: Option<String>,
}

impl BookingRecord {
    /// The booked resource and user, when both are present.
    pub fn resource_and_user(&self) -> Option<(&str, &str)> {
        let resource = self.resource.as_ref()?.id.as_str();
        let user = self.user.as_ref()?.id.as_deref()?;
        Some((resource, user))
    }
}

/// `GET /user/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
}

/// `GET /room/{id}`: a floor plan with its bookable resources.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

/// A bookable resource drawn as a polygon on the floor plan.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vertices: Vec<(f64, f64)>,
}
