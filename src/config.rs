// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Configuration
 * Endpoint, network and crawler settings with validation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReconConfig {
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Identity-provider and directory-API endpoints. Defaults target the
/// public cloud; overridable per environment (sovereign clouds, test
/// doubles).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndpointConfig {
    /// Base URL of the login / realm-discovery service
    #[validate(url)]
    pub login_base: String,

    /// Base URL of the federation-information autodiscover service
    #[validate(url)]
    pub autodiscover_base: String,

    /// Base URL of the directory object API
    #[validate(url)]
    pub graph_base: String,

    /// Suffix identifying the provider's default tenant domains
    #[validate(length(min = 1))]
    #[serde(default = "default_domain_suffix")]
    pub default_domain_suffix: String,

    /// MX exchange suffix indicating cloud mail delegation
    #[validate(length(min = 1))]
    #[serde(default = "default_mx_suffix")]
    pub cloud_mx_suffix: String,

    /// SPF include marker indicating cloud sender delegation
    #[validate(length(min = 1))]
    #[serde(default = "default_spf_marker")]
    pub cloud_spf_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NetworkConfig {
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[validate(length(min = 1))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    /// Concurrent domain probes during tenant enumeration
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_probe_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CrawlerConfig {
    /// Attempts per directory API call before surfacing the error
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Page size requested per directory API call
    #[validate(range(min = 1, max = 999))]
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_domain_suffix() -> String {
    "onmicrosoft.com".to_string()
}

fn default_mx_suffix() -> String {
    "mail.protection.outlook.com".to_string()
}

fn default_spf_marker() -> String {
    "include:spf.protection.outlook.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("luotain/{}", env!("CARGO_PKG_VERSION"))
}

fn default_probe_concurrency() -> usize {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_page_size() -> usize {
    100
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            login_base: "https://login.microsoftonline.com".to_string(),
            autodiscover_base: "https://autodiscover-s.outlook.com".to_string(),
            graph_base: "https://graph.microsoft.com/v1.0".to_string(),
            default_domain_suffix: default_domain_suffix(),
            cloud_mx_suffix: default_mx_suffix(),
            cloud_spf_marker: default_spf_marker(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_probe_concurrency(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            page_size: default_page_size(),
        }
    }
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            network: NetworkConfig::default(),
            probe: ProbeConfig::default(),
            crawler: CrawlerConfig::default(),
        }
    }
}

impl ReconConfig {
    /// Load defaults with environment-variable overrides
    pub fn from_env() -> ReconResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LUOTAIN_LOGIN_BASE") {
            config.endpoints.login_base = v;
        }
        if let Ok(v) = std::env::var("LUOTAIN_AUTODISCOVER_BASE") {
            config.endpoints.autodiscover_base = v;
        }
        if let Ok(v) = std::env::var("LUOTAIN_GRAPH_BASE") {
            config.endpoints.graph_base = v;
        }
        if let Ok(v) = std::env::var("LUOTAIN_TIMEOUT_SECS") {
            config.network.timeout_secs = v
                .parse()
                .map_err(|_| ReconError::Configuration(format!("invalid LUOTAIN_TIMEOUT_SECS: {}", v)))?;
        }
        if let Ok(v) = std::env::var("LUOTAIN_PROBE_CONCURRENCY") {
            config.probe.concurrency = v.parse().map_err(|_| {
                ReconError::Configuration(format!("invalid LUOTAIN_PROBE_CONCURRENCY: {}", v))
            })?;
        }

        config.validate_all()?;
        Ok(config)
    }

    /// Validate every section, surfacing the first violation
    pub fn validate_all(&self) -> ReconResult<()> {
        self.endpoints
            .validate()
            .and_then(|_| self.network.validate())
            .and_then(|_| self.probe.validate())
            .and_then(|_| self.crawler.validate())
            .map_err(|e| ReconError::Configuration(e.to_string()))
    }

    pub fn with_login_base(mut self, base: impl Into<String>) -> Self {
        self.endpoints.login_base = base.into();
        self
    }

    pub fn with_autodiscover_base(mut self, base: impl Into<String>) -> Self {
        self.endpoints.autodiscover_base = base.into();
        self
    }

    pub fn with_graph_base(mut self, base: impl Into<String>) -> Self {
        self.endpoints.graph_base = base.into();
        self
    }
}
