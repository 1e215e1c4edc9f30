//! REST client for the booking service.
//!
//! Wraps the three endpoints the engine needs (booking list, user
//! details, room resources) using [`reqwest`].

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::config::BookingConfig;
use crate::messages::{BookingRecord, Envelope, RoomRecord, UserRecord};

/// Bookings fetched per page.
const PAGE_LIMIT: usize = 50;

/// HTTP request timeout for a single call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from the booking REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum BookingApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Booking API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A 2xx response whose envelope status was not `success`.
    #[error("Booking API answered with status '{0}'")]
    Unsuccessful(String),
}

/// HTTP client for one booking-service site.
#[derive(Clone)]
pub struct BookingApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    location_id: String,
}

impl BookingApi {
    /// Create a client with its own connection pool.
    pub fn new(config: &BookingConfig) -> Result<Self, BookingApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &BookingConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            location_id: config.location_id.clone(),
        }
    }

    /// All bookings on `floor_id` for `date`, following pagination until a
    /// short page is returned.
    pub async fn list_bookings(
        &self,
        floor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BookingRecord>, BookingApiError> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut all = Vec::new();
        let mut offset = 0usize;

        loop {
            let limit = PAGE_LIMIT.to_string();
            let page_offset = offset.to_string();
            let request = self
                .get("resourceBooking/list")
                .query(&[
                    ("page[limit]", limit.as_str()),
                    ("page[offset]", page_offset.as_str()),
                    ("date[]", date.as_str()),
                    ("location", self.location_id.as_str()),
                    ("floor", floor_id),
                ]);

            let page: Vec<BookingRecord> = Self::parse_envelope(request.send().await?)
                .await?
                .unwrap_or_default();
            let fetched = page.len();
            all.extend(page);

            if fetched < PAGE_LIMIT {
                break;
            }
            offset += fetched;
        }

        Ok(all)
    }

    /// Details of a single user; `None` when the service has no such user.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, BookingApiError> {
        let response = self.get(&format!("user/{user_id}")).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse_envelope(response).await
    }

    /// A floor plan with its resources.
    pub async fn get_room(&self, room_id: &str) -> Result<RoomRecord, BookingApiError> {
        let response = self.get(&format!("room/{room_id}")).send().await?;
        Self::parse_envelope(response)
            .await?
            .ok_or_else(|| BookingApiError::Unsuccessful("room without data".into()))
    }

    // ---- private helpers ----

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{}", self.api_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-AUTH-MODE", "API-Key")
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
    }

    /// Ensure the response has a success status code, returning the status
    /// and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BookingApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BookingApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse the envelope and unwrap its payload.
    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, BookingApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.is_success() {
            return Err(BookingApiError::Unsuccessful(envelope.status));
        }
        Ok(envelope.data)
    }
}
