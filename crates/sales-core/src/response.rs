//! JSON envelopes shared by every handler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `{"status": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Success<T> {
    pub status: bool,
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self { status: true, data }
    }
}

/// One page of a collection together with its position in the whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> PageDocument<T> {
    pub fn new(items: Vec<T>, total_items: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total_items + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total_items,
            total_pages,
            page,
            page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ErrorDocument {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }

    pub fn with_fields(error: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            error: error.into(),
            fields: Some(fields),
        }
    }
}
