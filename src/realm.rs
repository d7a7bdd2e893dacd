// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Realm Discovery Client
 * Unauthenticated federation and desktop-SSO capability lookups
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::config::{EndpointConfig, NetworkConfig};
use crate::errors::{ReconError, ReconResult};
use crate::types::FederationType;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Synthetic local part used for realm-discovery probes; the account
/// does not need to exist
const PROBE_LOCAL_PART: &str = "probe";

/// Realm-discovery response for a single domain
#[derive(Debug, Clone, Deserialize)]
pub struct UserRealm {
    #[serde(rename = "NameSpaceType", default)]
    pub name_space_type: Option<String>,

    #[serde(rename = "FederationBrandName", default)]
    pub federation_brand_name: Option<String>,

    #[serde(rename = "AuthURL", default)]
    pub auth_url: Option<String>,

    #[serde(rename = "DomainName", default)]
    pub domain_name: Option<String>,
}

impl UserRealm {
    /// Classify the namespace type into the federation tri-state
    pub fn federation_type(&self) -> FederationType {
        match self.name_space_type.as_deref() {
            Some("Managed") => FederationType::Managed,
            Some("Federated") => FederationType::Federated,
            _ => FederationType::Unknown,
        }
    }

    /// Host of the federated authentication endpoint, when present
    pub fn sts_host(&self) -> Option<String> {
        let raw = self.auth_url.as_deref()?;
        let parsed = Url::parse(raw).ok()?;
        parsed.host_str().map(|h| h.to_string())
    }

    /// Brand name with empty strings normalized away
    pub fn brand(&self) -> Option<String> {
        self.federation_brand_name
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .map(|b| b.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CredentialTypeResponse {
    #[serde(rename = "EstsProperties", default)]
    ests_properties: Option<EstsProperties>,
}

#[derive(Debug, Deserialize)]
struct EstsProperties {
    #[serde(rename = "DesktopSsoEnabled", default)]
    desktop_sso_enabled: Option<bool>,
}

/// Client for the identity provider's unauthenticated discovery
/// endpoints (realm discovery and credential-type)
#[derive(Debug, Clone)]
pub struct RealmClient {
    http: reqwest::Client,
    login_base: String,
}

impl RealmClient {
    pub fn new(endpoints: &EndpointConfig, network: &NetworkConfig) -> ReconResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.timeout_secs))
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
            .user_agent(network.user_agent.clone())
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            login_base: endpoints.login_base.trim_end_matches('/').to_string(),
        })
    }

    /// Realm discovery via a synthetic username for the domain
    pub async fn get_user_realm(&self, domain: &str) -> ReconResult<UserRealm> {
        let login = format!("{}@{}", PROBE_LOCAL_PART, domain);
        let url = format!("{}/getuserrealm.srf?login={}&json=1", self.login_base, login);

        debug!(domain = domain, "Realm discovery lookup");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ReconError::Network {
                reason: format!("realm discovery returned {} for {}", status, domain),
            });
        }

        let realm: UserRealm = response.json().await.map_err(|e| ReconError::Parse {
            context: format!("realm discovery for {}", domain),
            reason: e.to_string(),
        })?;

        Ok(realm)
    }

    /// Desktop-SSO capability for a single domain. `None` means the
    /// endpoint did not state the capability either way.
    pub async fn desktop_sso_enabled(&self, domain: &str) -> ReconResult<Option<bool>> {
        let url = format!("{}/common/GetCredentialType", self.login_base);
        let body = serde_json::json!({
            "username": format!("{}@{}", PROBE_LOCAL_PART, domain),
            "isOtherIdpSupported": true,
        });

        debug!(domain = domain, "Desktop-SSO capability lookup");

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ReconError::Network {
                reason: format!("credential-type lookup returned {} for {}", status, domain),
            });
        }

        let parsed: CredentialTypeResponse =
            response.json().await.map_err(|e| ReconError::Parse {
                context: format!("credential-type response for {}", domain),
                reason: e.to_string(),
            })?;

        Ok(parsed
            .ests_properties
            .and_then(|props| props.desktop_sso_enabled))
    }
}
