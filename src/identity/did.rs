// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decentralized Identifier Parsing
//!
//! Validates the `did:<method>:<id>` format used to name devices.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::verifier::AuthError;

/// Validated decentralized identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string
    ///
    /// Accepts `did:<method>:<id>` where `method` is lowercase
    /// alphanumeric and `id` is non-empty with no whitespace.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        let mut parts = s.splitn(3, ':');

        let scheme = parts.next().unwrap_or_default();
        let method = parts.next().unwrap_or_default();
        let id = parts.next().unwrap_or_default();

        if scheme != "did" {
            return Err(AuthError::InvalidDid(s.to_string()));
        }
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(AuthError::InvalidDid(s.to_string()));
        }
        if id.is_empty() || id.chars().any(|c| c.is_whitespace()) {
            return Err(AuthError::InvalidDid(s.to_string()));
        }

        Ok(Did(s.to_string()))
    }

    /// The DID method component (e.g. `example` in `did:example:123`)
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
