//! Query parameters for list endpoints
//!
//! Parameters arrive as raw strings so that an empty value (`?complete=`)
//! means "not given" and a malformed one produces a `{"detail": ...}` 400
//! naming the parameter.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::config::PaginationConfig;
use crate::listing::{PageRequest, TodoFilters};

/// Query parameters accepted by `GET /todo` and `GET /admin/todo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
}

impl TodoListParams {
    /// Parse the filter parameters
    pub fn filters(&self) -> Result<TodoFilters, ApiError> {
        Ok(TodoFilters {
            search: self.search.clone(),
            complete: parse_bool("complete", self.complete.as_deref())?,
            category_id: parse_number("category_id", self.category_id.as_deref())?,
        })
    }

    /// Raw sort parameter
    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    /// Parse and validate the page parameters
    pub fn page_request(&self, config: &PaginationConfig) -> Result<PageRequest, ApiError> {
        page_request(self.page.as_deref(), self.page_size.as_deref(), config)
    }
}

/// Query parameters accepted by `GET /categories`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
}

impl CategoryListParams {
    /// Raw sort parameter
    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    /// Parse and validate the page parameters
    pub fn page_request(&self, config: &PaginationConfig) -> Result<PageRequest, ApiError> {
        page_request(self.page.as_deref(), self.page_size.as_deref(), config)
    }
}

fn page_request(
    page: Option<&str>,
    page_size: Option<&str>,
    config: &PaginationConfig,
) -> Result<PageRequest, ApiError> {
    let page = parse_number::<u64>("page", page)?;
    let page_size = parse_number::<u64>("page_size", page_size)?;
    Ok(PageRequest::from_parts(
        page,
        page_size,
        config.default_page_size,
        config.max_page_size,
    )?)
}

fn blank_to_none(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    let Some(raw) = blank_to_none(raw) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(ApiError::validation(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

fn parse_number<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    let Some(raw) = blank_to_none(raw) else {
        return Ok(None);
    };
    raw.parse::<T>().map(Some).map_err(|_| {
        ApiError::validation(format!("{} must be a non-negative integer, got '{}'", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;

    fn params(pairs: &[(&str, &str)]) -> TodoListParams {
        let mut params = TodoListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "complete" => params.complete = value,
                "category_id" => params.category_id = value,
                "search" => params.search = value,
                "sort" => params.sort = value,
                "page" => params.page = value,
                "page_size" => params.page_size = value,
                other => panic!("unknown parameter {}", other),
            }
        }
        params
    }

    #[test]
    fn test_defaults_when_absent() {
        let request = TodoListParams::default()
            .page_request(&PaginationConfig::default())
            .unwrap();
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 10);
        assert_eq!(TodoListParams::default().filters().unwrap(), TodoFilters::default());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let p = params(&[("complete", ""), ("page", ""), ("category_id", " ")]);
        let filters = p.filters().unwrap();
        assert_eq!(filters.complete, None);
        assert_eq!(filters.category_id, None);
        assert_eq!(p.page_request(&PaginationConfig::default()).unwrap().page(), 1);
    }

    #[test]
    fn test_boolean_spellings() {
        for (raw, expected) in [("true", true), ("TRUE", true), ("1", true), ("false", false), ("0", false)] {
            let filters = params(&[("complete", raw)]).filters().unwrap();
            assert_eq!(filters.complete, Some(expected), "complete={}", raw);
        }
        let err = params(&[("complete", "yes")]).filters().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert!(err.message.contains("complete"));
    }

    #[test]
    fn test_invalid_page_parameters() {
        let config = PaginationConfig::default();
        for pairs in [
            vec![("page", "0")],
            vec![("page", "-1")],
            vec![("page", "two")],
            vec![("page_size", "0")],
            vec![("page_size", "101")],
        ] {
            let err = params(&pairs).page_request(&config).unwrap_err();
            assert_eq!(err.kind, ApiErrorKind::Validation, "{:?}", pairs);
        }
    }

    #[test]
    fn test_configured_max_page_size() {
        let config = PaginationConfig {
            default_page_size: 5,
            max_page_size: 20,
        };
        assert!(params(&[("page_size", "20")]).page_request(&config).is_ok());
        assert!(params(&[("page_size", "21")]).page_request(&config).is_err());
        assert_eq!(
            TodoListParams::default().page_request(&config).unwrap().page_size(),
            5
        );
    }
}
