use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::claims::Claims;
use crate::role::Role;

/// A named authorization predicate over claims and an optional target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Holds ADMIN or USER.
    Any,
    AdminOnly,
    UserOnly,
    /// Holds ADMIN, or is the user the request targets.
    AdminOrSubject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown authorization rule {0:?}")]
pub struct UnknownRule(pub String);

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Any => "any",
            Rule::AdminOnly => "admin_only",
            Rule::UserOnly => "user_only",
            Rule::AdminOrSubject => "admin_or_subject",
        }
    }

    pub fn evaluate(&self, claims: &Claims, target: Option<Uuid>) -> bool {
        match self {
            Rule::Any => claims.has_any_role(&Role::ALL),
            Rule::AdminOnly => claims.has_role(Role::Admin),
            Rule::UserOnly => claims.has_role(Role::User),
            Rule::AdminOrSubject => {
                if claims.has_role(Role::Admin) {
                    return true;
                }
                // The subject must match the route's user; with no target there
                // is nothing to own.
                match target {
                    Some(id) => Uuid::parse_str(&claims.sub).is_ok_and(|sub| sub == id),
                    None => false,
                }
            }
        }
    }
}

impl FromStr for Rule {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Rule::Any),
            "admin_only" => Ok(Rule::AdminOnly),
            "user_only" => Ok(Rule::UserOnly),
            "admin_or_subject" => Ok(Rule::AdminOrSubject),
            other => Err(UnknownRule(other.to_string())),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: Uuid, roles: &[Role]) -> Claims {
        Claims {
            sub: sub.to_string(),
            iss: "service project".to_string(),
            iat: 0,
            exp: 0,
            roles: roles.iter().copied().collect(),
        }
    }

    #[test]
    fn test_names_resolve() {
        for rule in [Rule::Any, Rule::AdminOnly, Rule::UserOnly, Rule::AdminOrSubject] {
            assert_eq!(rule.as_str().parse::<Rule>().unwrap(), rule);
        }
        assert_eq!(
            "root_only".parse::<Rule>(),
            Err(UnknownRule("root_only".to_string()))
        );
    }

    #[test]
    fn test_role_rules() {
        let id = Uuid::new_v4();
        let admin = claims(id, &[Role::Admin]);
        let user = claims(id, &[Role::User]);
        let nobody = claims(id, &[]);

        assert!(Rule::AdminOnly.evaluate(&admin, None));
        assert!(!Rule::AdminOnly.evaluate(&user, None));
        assert!(Rule::UserOnly.evaluate(&user, None));
        assert!(!Rule::UserOnly.evaluate(&admin, None));
        assert!(Rule::Any.evaluate(&admin, None));
        assert!(Rule::Any.evaluate(&user, None));
        assert!(!Rule::Any.evaluate(&nobody, None));
    }

    #[test]
    fn test_admin_or_subject() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let user = claims(me, &[Role::User]);
        let admin = claims(other, &[Role::Admin]);

        assert!(Rule::AdminOrSubject.evaluate(&user, Some(me)));
        assert!(!Rule::AdminOrSubject.evaluate(&user, Some(other)));
        assert!(!Rule::AdminOrSubject.evaluate(&user, None));
        assert!(Rule::AdminOrSubject.evaluate(&admin, Some(me)));
        assert!(Rule::AdminOrSubject.evaluate(&admin, None));
    }

    #[test]
    fn test_subject_compared_as_uuid() {
        let me = Uuid::new_v4();
        let mut upper = claims(me, &[Role::User]);
        upper.sub = me.to_string().to_uppercase();
        assert!(Rule::AdminOrSubject.evaluate(&upper, Some(me)));
    }
}
