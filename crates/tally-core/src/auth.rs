//! # Authentication Capability
//!
//! The pipelines take an already-authenticated employee id. Turning
//! credentials into a [`Principal`] is the job of an [`Authenticator`]
//! implementation (tally-db ships an argon2-backed one).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// Login credentials.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub employee_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(employee_id: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            employee_id: employee_id.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("employee_id", &self.employee_id)
            .field("password", &"***")
            .finish()
    }
}

/// An authenticated employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub employee_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(employee_id: impl Into<String>, role: Role) -> Self {
        Principal {
            employee_id: employee_id.into(),
            role,
        }
    }

    /// Fails with `Forbidden` unless the principal has `role`. Admin
    /// satisfies every role.
    pub fn require_role(&self, role: Role) -> CoreResult<()> {
        match (self.role, role) {
            (Role::Admin, _) => Ok(()),
            (actual, required) if actual == required => Ok(()),
            (_, required) => Err(CoreError::Forbidden { required }),
        }
    }
}

/// Turns credentials into a principal.
pub trait Authenticator: Send + Sync {
    /// Fails with `InvalidCredentials` for unknown employees, inactive
    /// employees and wrong passwords alike.
    fn authenticate(&self, credentials: &Credentials) -> impl Future<Output = CoreResult<Principal>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_role() {
        let admin = Principal::new("A1", Role::Admin);
        let cashier = Principal::new("C1", Role::Cashier);

        assert!(admin.require_role(Role::Admin).is_ok());
        assert!(admin.require_role(Role::Cashier).is_ok());
        assert!(cashier.require_role(Role::Cashier).is_ok());
        assert!(matches!(
            cashier.require_role(Role::Admin),
            Err(CoreError::Forbidden { required: Role::Admin })
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("C1", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
