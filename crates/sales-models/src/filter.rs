//! Filters for the user list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sales_core::FieldErrors;
use uuid::Uuid;

use crate::email::Email;
use crate::users::User;

/// Optional constraints on a user query. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub user_id: Option<Uuid>,
    /// Substring match on the name.
    pub name: Option<String>,
    pub email: Option<Email>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

impl QueryFilter {
    /// Reads the filter from query parameters. Dates are RFC 3339.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filter = QueryFilter::default();

        if let Some(raw) = value(query, "user_id") {
            match Uuid::parse_str(raw) {
                Ok(id) => filter.user_id = Some(id),
                Err(e) => errors.add("user_id", e.to_string()),
            }
        }

        if let Some(raw) = value(query, "name") {
            filter.name = Some(raw.to_string());
        }

        if let Some(raw) = value(query, "email") {
            match Email::new(raw) {
                Ok(email) => filter.email = Some(email),
                Err(e) => errors.add("email", e.to_string()),
            }
        }

        for (key, slot) in [
            ("start_created_date", &mut filter.start_created_date),
            ("end_created_date", &mut filter.end_created_date),
        ] {
            if let Some(raw) = value(query, key) {
                match DateTime::parse_from_rfc3339(raw) {
                    Ok(date) => *slot = Some(date.with_timezone(&Utc)),
                    Err(e) => errors.add(key, e.to_string()),
                }
            }
        }

        errors.into_result()?;
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        *self == QueryFilter::default()
    }

    /// In-process evaluation, equivalent to the SQL the store builds.
    pub fn matches(&self, user: &User) -> bool {
        if self.user_id.is_some_and(|id| id != user.id) {
            return false;
        }
        if let Some(name) = &self.name {
            if !user.name.contains(name.as_str()) {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if user.email != *email {
                return false;
            }
        }
        if self.start_created_date.is_some_and(|start| user.created_at < start) {
            return false;
        }
        if self.end_created_date.is_some_and(|end| user.created_at > end) {
            return false;
        }
        true
    }
}

fn value<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}
