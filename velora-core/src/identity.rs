use serde::{Deserialize, Serialize};

/// Role granted by the upstream identity collaborator.
///
/// The engine never derives roles itself; they arrive with every request
/// and are trusted as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Operator,
    Admin,
}

impl Role {
    /// Operators and admins may confirm, complete, and cancel any booking.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Operator | Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller on whose behalf an operation executes.
///
/// Passed explicitly into every policy and transition call so the engine
/// stays deterministic and testable without ambient request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::Customer }
    }

    pub fn operator(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::Operator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("operator").unwrap(), Role::Operator);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("root").is_err());
    }

    #[test]
    fn test_privilege_check() {
        assert!(!Role::Customer.is_privileged());
        assert!(Role::Operator.is_privileged());
        assert!(Role::Admin.is_privileged());
    }
}
