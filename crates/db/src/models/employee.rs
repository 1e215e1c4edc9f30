//! Employee (directory) rows.

use serde::Serialize;
use sprout_core::presence::Person;
use sprout_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub real_name: String,
    pub mail: Option<String>,
    pub messaging_handle: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Employee> for Person {
    fn from(row: Employee) -> Self {
        Person {
            id: row.id,
            display_name: row.real_name,
            email: row.mail,
            messaging_handle: row.messaging_handle.filter(|h| !h.trim().is_empty()),
        }
    }
}

/// DTO for registering a person discovered in a booking.
#[derive(Debug, Clone)]
pub struct CreateEmployee {
    pub real_name: String,
    pub mail: String,
}
