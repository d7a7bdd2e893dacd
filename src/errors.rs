// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reconnaissance Error Types
 * Production-ready error handling with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Main recon error type covering both the unauthenticated probing
/// surface and the authenticated directory crawl
#[derive(Error, Debug)]
pub enum ReconError {
    /// Seed domain is not registered with the directory service
    #[error("Tenant not found for domain: {domain}")]
    TenantNotFound { domain: String },

    /// No bearer token could be supplied for the requested resource
    #[error("No credential available for resource: {resource}")]
    NoCredential { resource: String },

    /// The directory API rejected our token
    #[error("Unauthorized while fetching {resource}")]
    Unauthorized { resource: String },

    /// The requested object does not exist (treated as an empty result)
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The directory API throttled us and retries were exhausted
    #[error("Rate limited on {resource}: retry after {retry_after:?}")]
    RateLimited {
        resource: String,
        retry_after: Option<Duration>,
    },

    /// Request exceeded the per-call network timeout
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Connection-level failure (reset, refused, unreachable)
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// Response body could not be parsed into the expected shape
    #[error("Failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// General errors
    #[error("Recon error: {0}")]
    General(String),
}

impl ReconError {
    /// Check if the error is retryable at the client boundary
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconError::RateLimited { .. }
                | ReconError::Timeout { .. }
                | ReconError::Network { .. }
        )
    }

    /// Fatal errors abort the whole recon invocation instead of
    /// degrading a single sub-fetch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReconError::TenantNotFound { .. }
                | ReconError::NoCredential { .. }
                | ReconError::Unauthorized { .. }
                | ReconError::Configuration(_)
        )
    }

    /// Get suggested retry delay for this error
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            ReconError::RateLimited { retry_after, .. } => *retry_after,
            ReconError::Timeout { .. } => Some(Duration::from_secs(5)),
            _ => None,
        }
    }
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for ReconError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();

        if err.is_timeout() {
            ReconError::Timeout {
                duration: Duration::from_secs(30),
            }
        } else if err.is_connect() {
            ReconError::Network {
                reason: format!("connection failed for {}: {}", url, err),
            }
        } else if err.is_decode() {
            ReconError::Parse {
                context: url,
                reason: err.to_string(),
            }
        } else {
            ReconError::General(err.to_string())
        }
    }
}

/// Result type for recon operations
pub type ReconResult<T> = Result<T, ReconError>;
