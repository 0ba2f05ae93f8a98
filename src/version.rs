// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Embedding Gateway

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Version banner logged at startup
pub fn get_version_string() -> String {
    format!("{} v{}", NAME, VERSION)
}
