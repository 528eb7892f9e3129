//! Page-based pagination parsed from query parameters.

use std::collections::HashMap;

use crate::validate::FieldErrors;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Reads `page` and `page_size` from the query string.
    ///
    /// Missing or empty values fall back to the defaults. Anything that is not
    /// an integer in range is reported against its field.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let number = match non_empty(query, "page") {
            None => DEFAULT_PAGE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                Ok(_) => {
                    errors.add("page", "page must be greater than or equal to 1");
                    DEFAULT_PAGE
                }
                Err(_) => {
                    errors.add("page", format!("page conversion error for {:?}", raw));
                    DEFAULT_PAGE
                }
            },
        };

        let size = match non_empty(query, "page_size") {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
                Ok(_) => {
                    errors.add(
                        "page_size",
                        format!("page_size must be between 1 and {}", MAX_PAGE_SIZE),
                    );
                    DEFAULT_PAGE_SIZE
                }
                Err(_) => {
                    errors.add("page_size", format!("page_size conversion error for {:?}", raw));
                    DEFAULT_PAGE_SIZE
                }
            },
        };

        errors.into_result()?;
        Ok(Self { number, size })
    }

    /// Rows to skip. Saturates for page numbers past any real result set.
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }
}

fn non_empty<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let page = Page::parse(&HashMap::new()).unwrap();
        assert_eq!(page, Page::default());
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_explicit_values() {
        let page = Page::parse(&query(&[("page", "3"), ("page_size", "20")])).unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.size, 20);
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_empty_value_uses_default() {
        let page = Page::parse(&query(&[("page", ""), ("page_size", " ")])).unwrap();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_out_of_range() {
        let errors = Page::parse(&query(&[("page", "0"), ("page_size", "101")])).unwrap_err();
        assert!(errors.get("page").is_some());
        assert!(errors.get("page_size").is_some());
    }

    #[test]
    fn test_not_a_number() {
        let errors = Page::parse(&query(&[("page", "abc")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("page").unwrap().contains("abc"));
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let page = Page::parse(&query(&[("page", "9223372036854775807")])).unwrap();
        assert_eq!(page.offset(), i64::MAX);
    }
}
