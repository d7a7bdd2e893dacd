// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Token Provider Seam
 * Opaque credential supply for the directory API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ReconError, ReconResult};

/// Opaque bearer-token supplier. The crawl core never refreshes or
/// caches tokens itself; it asks this seam per resource and treats a
/// missing credential as fatal.
pub trait TokenProvider: Send + Sync {
    fn get_token(&self, resource: &str, tenant_hint: Option<&str>) -> ReconResult<String>;
}

/// Fixed token handed in by the caller (CLI flag, test fixture)
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn get_token(&self, resource: &str, _tenant_hint: Option<&str>) -> ReconResult<String> {
        if self.token.is_empty() {
            return Err(ReconError::NoCredential {
                resource: resource.to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

/// Token read from an environment variable at call time
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub const DEFAULT_VAR: &'static str = "LUOTAIN_ACCESS_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl TokenProvider for EnvTokenProvider {
    fn get_token(&self, resource: &str, _tenant_hint: Option<&str>) -> ReconResult<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(ReconError::NoCredential {
                resource: resource.to_string(),
            }),
        }
    }
}
