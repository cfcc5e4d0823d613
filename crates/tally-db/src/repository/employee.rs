//! # Employee Repository
//!
//! Employee records and their password hashes. Hashing itself lives in
//! [`crate::auth`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_identifier;
use tally_core::Employee;

/// Repository for employee records.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Gets an employee by id, including the password hash.
    pub async fn get_by_id(&self, employee_id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT employee_id, role, first_name, last_name, contact_number, email,
                   password_hash, is_active, created_at
            FROM employees
            WHERE employee_id = ?1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Inserts an employee. `password_hash` must already be a PHC string.
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(employee_id = %employee.employee_id, role = %employee.role, "Inserting employee");

        validate_identifier("employee_id", &employee.employee_id).map_err(|e| DbError::InvalidData(e.to_string()))?;
        if employee.password_hash.is_empty() {
            return Err(DbError::InvalidData("password_hash is required".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO employees
                (employee_id, role, first_name, last_name, contact_number, email,
                 password_hash, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(employee.role)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.contact_number)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, employee.employee_id.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Enables or disables an employee's login.
    pub async fn set_active(&self, employee_id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE employees SET is_active = ?2 WHERE employee_id = ?1")
            .bind(employee_id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", employee_id));
        }
        Ok(())
    }

    /// Counts all employees.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
