// Version information for the LCore Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-dual-encryption-2025-08-29";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-08-29";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "device-registration",
    "credential-auth",
    "dual-encryption",
    "replay-protection",
    "cartesi-submission",
];
