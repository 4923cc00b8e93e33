// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coarse user role marker.

use serde::{Deserialize, Serialize};

/// User roles as reported by the rewards API.
///
/// ## Role Hierarchy
///
/// - `Admin` - access to the admin console and KYC review
/// - `User` - regular member
///
/// Unrecognized role strings deserialize as `User` (least privilege).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Regular member
    User,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value).unwrap_or_default()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" User "), Some(Role::User));
        assert_eq!(Role::parse("merchant"), None);
    }

    #[test]
    fn serde_uses_lowercase_and_falls_back_to_user() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let parsed: Role = serde_json::from_str(r#""Admin""#).unwrap();
        assert_eq!(parsed, Role::Admin);
        let unknown: Role = serde_json::from_str(r#""auditor""#).unwrap();
        assert_eq!(unknown, Role::User);
    }
}
