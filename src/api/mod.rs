// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Boundary Response Shapes
//!
//! The response/error normalizer plus the pagination and health-check
//! shapes boundary collaborators consume. No routing lives here; the
//! transport layer is an external collaborator.

pub mod response;

pub use response::{
    wrap, ApiError, ApiResponseWrapper, ErrorCode, HealthCheck, HealthStatus,
    PaginatedResponse, PaginationParams, ResponseMeta, ServiceHealth, ServiceStatus, SortOrder,
};
