//! # Employee Authentication
//!
//! Argon2 password hashing and the [`Authenticator`] backed by the
//! employees table.
//!
//! ## Flow
//! ```text
//! Credentials { employee_id, password }
//!       │
//!       ▼
//! employees row? ── no ──────────────┐
//!       │                            │
//!       ▼                            │
//! is_active? ── no ──────────────────┤
//!       │                            ▼
//!       ▼                     InvalidCredentials
//! argon2 verify ── mismatch ─────────┘
//!       │
//!       ▼
//! Principal { employee_id, role }
//! ```
//!
//! All three failures look the same to the caller so a login form cannot
//! be used to probe for valid employee ids.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::employee::EmployeeRepository;
use tally_core::{Authenticator, CoreError, CoreResult, Credentials, Principal};

/// Hashes a password into a PHC string for the employees table.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash. Unparseable hashes never
/// verify.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Authenticates employees against their stored argon2 hashes.
#[derive(Debug, Clone)]
pub struct PasswordAuthenticator {
    employees: EmployeeRepository,
}

impl PasswordAuthenticator {
    pub fn new(employees: EmployeeRepository) -> Self {
        PasswordAuthenticator { employees }
    }
}

impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> CoreResult<Principal> {
        let Some(employee) = self.employees.get_by_id(&credentials.employee_id).await? else {
            debug!(employee_id = %credentials.employee_id, "Login for unknown employee");
            return Err(CoreError::InvalidCredentials);
        };

        if !employee.is_active {
            warn!(employee_id = %employee.employee_id, "Login attempt by inactive employee");
            return Err(CoreError::InvalidCredentials);
        }

        if !verify_password(&credentials.password, &employee.password_hash) {
            warn!(employee_id = %employee.employee_id, "Login failed: wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        debug!(employee_id = %employee.employee_id, role = %employee.role, "Employee authenticated");
        Ok(Principal::new(employee.employee_id, employee.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_employee;
    use crate::pool::{Database, DbConfig};
    use tally_core::{ErrorKind, Role};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("letmein").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("letmein", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("letmein", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let hash = hash_password("letmein").unwrap();
        db.employees()
            .insert(&sample_employee("A1", Role::Admin, &hash))
            .await
            .unwrap();
        db.employees()
            .insert(&sample_employee("C9", Role::Cashier, &hash))
            .await
            .unwrap();
        db.employees().set_active("C9", false).await.unwrap();

        let auth = db.authenticator();

        let principal = auth.authenticate(&Credentials::new("A1", "letmein")).await.unwrap();
        assert_eq!(principal, Principal::new("A1", Role::Admin));

        for creds in [
            Credentials::new("A1", "nope"),
            Credentials::new("ZZ", "letmein"),
            Credentials::new("C9", "letmein"),
        ] {
            let err = auth.authenticate(&creds).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidCredentials));
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
        }
    }
}
