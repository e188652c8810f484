// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response/Error Normalizer
//!
//! Maps internal results to the uniform response wrapper every boundary
//! collaborator sees. `wrap` is total: any `Result` becomes a wrapper
//! with populated metadata, and failures carry a stable `code` from the
//! error taxonomy.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::crypto::CryptoError;
use crate::identity::AuthError;
use crate::ingest::IngestError;

/// Uniform failure shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Metadata attached to every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Unix-epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "processingTime", skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            request_id: Uuid::new_v4().to_string(),
            processing_time: None,
        }
    }
}

/// Uniform response wrapper for all boundary collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponseWrapper<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub meta: ResponseMeta,
}

/// Errors that normalize into an [`ApiError`]
pub trait ErrorCode {
    /// Stable code from the error taxonomy
    fn code(&self) -> &'static str;
    fn message(&self) -> String;
    fn details(&self) -> Option<serde_json::Value> {
        None
    }
}

impl ErrorCode for AuthError {
    fn code(&self) -> &'static str {
        AuthError::code(self)
    }
    fn message(&self) -> String {
        self.to_string()
    }
}

impl ErrorCode for IngestError {
    fn code(&self) -> &'static str {
        IngestError::code(self)
    }
    fn message(&self) -> String {
        self.to_string()
    }
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        CryptoError::code(self)
    }
    fn message(&self) -> String {
        self.to_string()
    }
}

/// Normalize a result into the uniform wrapper
///
/// Total over its input domain; never panics. `meta.timestamp` and
/// `meta.requestId` are always populated, `data` is omitted on failure.
pub fn wrap<T, E: ErrorCode>(result: Result<T, E>) -> ApiResponseWrapper<T> {
    match result {
        Ok(data) => ApiResponseWrapper {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::now(),
        },
        Err(e) => ApiResponseWrapper {
            success: false,
            data: None,
            error: Some(ApiError {
                code: e.code().to_string(),
                message: e.message(),
                details: e.details(),
            }),
            meta: ResponseMeta::now(),
        },
    }
}

impl<T> ApiResponseWrapper<T> {
    /// Record how long the request took
    pub fn with_processing_time(mut self, millis: u64) -> Self {
        self.meta.processing_time = Some(millis);
        self
    }
}

/// Pagination request parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "sortBy", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// Slice one page out of a full result set
    ///
    /// Pages are 1-based; page 0 is treated as page 1.
    pub fn paginate(mut items: Vec<T>, params: &PaginationParams) -> Self {
        let total = items.len();
        let limit = params.limit.max(1);
        let page = params.page.max(1);
        let start = (page - 1).saturating_mul(limit);

        let page_items: Vec<T> = if start >= total {
            Vec::new()
        } else {
            items.drain(start..total.min(start + limit)).collect()
        };

        Self {
            has_more: start + page_items.len() < total,
            items: page_items,
            total,
            page,
            limit,
        }
    }
}

/// Overall service health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Down,
}

/// Per-collaborator health entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    /// Probe latency in milliseconds
    pub latency: u64,
}

/// Health report for the node and its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub version: String,
    /// Unix-epoch milliseconds
    pub timestamp: i64,
    pub services: HashMap<String, ServiceHealth>,
}

impl HealthCheck {
    /// Build a report; overall status is derived from the services
    ///
    /// All up -> healthy, some down -> degraded, all down -> unhealthy.
    pub fn from_services(version: &str, services: HashMap<String, ServiceHealth>) -> Self {
        let total = services.len();
        let down = services
            .values()
            .filter(|s| s.status == ServiceStatus::Down)
            .count();
        let status = if total == 0 || down == 0 {
            HealthStatus::Healthy
        } else if down < total {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            version: version.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            services,
        }
    }
}
