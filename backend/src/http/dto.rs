//! Request and response shapes for the REST API.
//!
//! Endpoint payloads live in [`crate::routes`]; this module holds the
//! envelopes every endpoint shares and the query-string structs.

use serde::{Deserialize, Serialize};

use crate::api::{HeatmapMetadata, HeatmapRow, PageInfo};
use crate::models::{Page, PageRequest};

/// `{ success: true, data, message? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// `{ success: true, data: [...], pagination: { total, page, pages } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> PaginatedResponse<T> {
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        U: Into<T>,
    {
        let pagination = page.info();
        Self {
            success: true,
            data: page.items.into_iter().map(Into::into).collect(),
            pagination,
        }
    }
}

/// Body of `GET /api/access/heatmap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub success: bool,
    pub data: Vec<HeatmapRow>,
    pub metadata: HeatmapMetadata,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// `?page=&limit=`. Values are kept as text and parsed leniently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

fn parse_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::from_raw(parse_i64(self.page.as_deref()), parse_i64(self.limit.as_deref()))
    }
}

/// `?page=&limit=&search=` for the bitácora listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl AuditListQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::from_raw(parse_i64(self.page.as_deref()), parse_i64(self.limit.as_deref()))
    }
}

/// `?days=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeatmapQuery {
    #[serde(default)]
    pub days: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_PAGE_LIMIT;

    #[test]
    fn test_page_query_is_lenient() {
        let q = PageQuery {
            page: Some("2".to_string()),
            limit: Some("abc".to_string()),
        };
        let req = q.to_request();
        assert_eq!(req.page, 2);
        assert_eq!(req.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_api_response_omits_missing_message() {
        let value = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("message").is_none());
        let value = serde_json::to_value(ApiResponse::ok(1).with_message("hecho")).unwrap();
        assert_eq!(value["message"], "hecho");
    }

    #[test]
    fn test_paginated_response_maps_items() {
        let page = Page::from_ordered(vec![1u8, 2, 3], PageRequest::from_raw(Some(1), Some(2)));
        let resp: PaginatedResponse<u32> = PaginatedResponse::from_page(page);
        assert_eq!(resp.data, vec![1, 2]);
        assert_eq!(resp.pagination.pages, 2);
        assert_eq!(resp.pagination.total, 3);
    }
}
