//! Repository for the `employees` table.

use sprout_core::types::DbId;
use sqlx::PgPool;

use crate::models::employee::{CreateEmployee, Employee};

/// Column list for `employees` queries.
const COLUMNS: &str = "id, real_name, mail, messaging_handle, created_at, updated_at";

/// Provides directory lookups and registration.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Find an employee by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find all employees whose mail matches one of `mails`, ignoring case.
    pub async fn list_by_mails(
        pool: &PgPool,
        mails: &[String],
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees \
             WHERE LOWER(mail) = ANY(SELECT LOWER(m) FROM UNNEST($1::text[]) AS m) \
             ORDER BY id"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(mails)
            .fetch_all(pool)
            .await
    }

    /// Insert every person whose mail is not registered yet.
    ///
    /// Returns the number of rows created.
    pub async fn create_missing(
        pool: &PgPool,
        people: &[CreateEmployee],
    ) -> Result<u64, sqlx::Error> {
        if people.is_empty() {
            return Ok(0);
        }
        let names: Vec<&str> = people.iter().map(|p| p.real_name.as_str()).collect();
        let mails: Vec<&str> = people.iter().map(|p| p.mail.as_str()).collect();

        let result = sqlx::query(
            "INSERT INTO employees (real_name, mail) \
             SELECT n, m FROM UNNEST($1::text[], $2::text[]) AS u(n, m) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&names)
        .bind(&mails)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Store the chat handle resolved for an employee.
    pub async fn set_messaging_handle(
        pool: &PgPool,
        id: DbId,
        handle: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE employees SET messaging_handle = $2 WHERE id = $1")
            .bind(id)
            .bind(handle)
            .execute(pool)
            .await?;
        Ok(())
    }
}
