//! Token claims.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The principal carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id of the principal.
    pub sub: String,
    pub iss: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    pub roles: BTreeSet<Role>,
}

impl Claims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: &[Role]) -> Claims {
        Claims {
            sub: "5cf37266-3473-4006-984f-9325122678b7".to_string(),
            iss: "service project".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            roles: roles.iter().copied().collect(),
        }
    }

    #[test]
    fn test_roles_serialize_as_names() {
        let json = serde_json::to_value(claims(&[Role::User, Role::Admin])).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["ADMIN", "USER"]));
    }

    #[test]
    fn test_duplicate_roles_collapse() {
        let json = r#"{"sub":"x","iss":"i","iat":1,"exp":2,"roles":["USER","USER"]}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.roles.len(), 1);
    }

    #[test]
    fn test_unknown_role_in_token_rejected() {
        let json = r#"{"sub":"x","iss":"i","iat":1,"exp":2,"roles":["SUPERUSER"]}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_has_role() {
        let c = claims(&[Role::User]);
        assert!(c.has_role(Role::User));
        assert!(!c.has_role(Role::Admin));
        assert!(c.has_any_role(&[Role::Admin, Role::User]));
    }
}
