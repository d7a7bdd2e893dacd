// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tenant Domain Signal Collector
 * Tenant resolution, verified-domain enumeration and probe fan-out
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::config::ReconConfig;
use crate::errors::{ReconError, ReconResult};
use crate::probe::{DomainProbe, ProbeOutcome};
use crate::types::{DesktopSsoState, TenantProfile};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

static TENANT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("tenant id pattern is valid")
});

static DOMAIN_ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Domain>([^<]+)</Domain>").expect("domain pattern is valid"));

#[derive(Debug, Deserialize)]
struct OpenIdConfiguration {
    #[serde(default)]
    token_endpoint: Option<String>,
    #[serde(default)]
    issuer: Option<String>,
}

/// Caller-injected tenant selection, decoupled from any console
pub enum TenantSelector<'a> {
    First,
    Index(usize),
    Predicate(&'a dyn Fn(&TenantProfile) -> bool),
}

/// Pure selection over candidate tenants
pub fn choose_tenant<'t>(
    tenants: &'t [TenantProfile],
    selector: &TenantSelector<'_>,
) -> Option<&'t TenantProfile> {
    match selector {
        TenantSelector::First => tenants.first(),
        TenantSelector::Index(i) => tenants.get(*i),
        TenantSelector::Predicate(pred) => tenants.iter().find(|t| pred(t)),
    }
}

/// Unauthenticated tenant reconnaissance: resolves the tenant behind a
/// seed domain and probes each verified domain
pub struct TenantRecon {
    http: reqwest::Client,
    probe: DomainProbe,
    config: ReconConfig,
}

impl TenantRecon {
    pub fn new(config: ReconConfig) -> ReconResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.network.timeout_secs))
            .connect_timeout(Duration::from_secs(config.network.connect_timeout_secs))
            .user_agent(config.network.user_agent.clone())
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let probe = DomainProbe::new(&config)?;

        Ok(Self {
            http,
            probe,
            config,
        })
    }

    /// Collect the tenant profile for a seed domain. Tenant resolution
    /// and the initial domain list are on the seed path and fatal;
    /// individual domain probes degrade to defaults.
    pub async fn collect(
        &self,
        seed_domain: &str,
        single_domain_only: bool,
    ) -> ReconResult<TenantProfile> {
        info!(domain = seed_domain, "Starting tenant reconnaissance");

        let tenant_id = self.resolve_tenant_id(seed_domain).await?;
        debug!(tenant_id = %tenant_id, "Resolved tenant");

        let domains = if single_domain_only {
            vec![seed_domain.to_string()]
        } else {
            self.enumerate_domains(seed_domain).await?
        };

        info!("Probing {} domain(s)", domains.len());

        // Bounded fan-out; `buffered` keeps outcomes in input order
        let probe = &self.probe;
        let outcomes: Vec<ProbeOutcome> = stream::iter(domains)
            .map(|domain| async move { probe.probe(&domain).await })
            .buffered(self.config.probe.concurrency)
            .collect()
            .await;

        let brand_name = outcomes.iter().find_map(|o| o.brand.clone());
        let canonical_name = canonical_tenant_name(
            &outcomes,
            &self.config.endpoints.default_domain_suffix,
        );
        let desktop_sso = aggregate_desktop_sso(&outcomes);

        let profile = TenantProfile {
            tenant_id,
            brand_name,
            canonical_name,
            desktop_sso,
            domains: outcomes.into_iter().map(|o| o.record).collect(),
        };

        info!(
            "[SUCCESS] Tenant recon complete: {} domain(s), desktop SSO {}",
            profile.domains.len(),
            profile.desktop_sso
        );

        Ok(profile)
    }

    /// Resolve the tenant identifier via the provider's OpenID
    /// configuration document. An unregistered domain is fatal.
    async fn resolve_tenant_id(&self, domain: &str) -> ReconResult<String> {
        let url = format!(
            "{}/{}/.well-known/openid-configuration",
            self.config.endpoints.login_base.trim_end_matches('/'),
            domain
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status.is_client_error() {
            return Err(ReconError::TenantNotFound {
                domain: domain.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ReconError::Network {
                reason: format!("openid configuration returned {} for {}", status, domain),
            });
        }

        let openid: OpenIdConfiguration =
            response.json().await.map_err(|e| ReconError::Parse {
                context: format!("openid configuration for {}", domain),
                reason: e.to_string(),
            })?;

        extract_tenant_id(&openid).ok_or_else(|| ReconError::Parse {
            context: format!("openid configuration for {}", domain),
            reason: "no tenant id in token endpoint or issuer".to_string(),
        })
    }

    /// Enumerate the tenant's verified domains via the
    /// federation-information endpoint
    async fn enumerate_domains(&self, seed_domain: &str) -> ReconResult<Vec<String>> {
        let url = format!(
            "{}/autodiscover/autodiscover.svc",
            self.config.endpoints.autodiscover_base.trim_end_matches('/')
        );

        let envelope = federation_information_request(seed_domain, &url);

        debug!(domain = seed_domain, "Fetching verified domain list");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header(
                "SOAPAction",
                "\"http://schemas.microsoft.com/exchange/2010/Autodiscover/Autodiscover/GetFederationInformation\"",
            )
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReconError::Network {
                reason: format!(
                    "federation information returned {} for {}",
                    status, seed_domain
                ),
            });
        }

        let body = response.text().await?;
        let mut domains = extract_domains(&body);

        if domains.is_empty() {
            warn!(
                domain = seed_domain,
                "Federation information listed no domains, falling back to seed"
            );
            domains.push(seed_domain.to_string());
        } else if !domains.iter().any(|d| d.eq_ignore_ascii_case(seed_domain)) {
            domains.insert(0, seed_domain.to_string());
        }

        Ok(domains)
    }
}

/// First domain matching the provider's default-domain suffix
fn canonical_tenant_name(outcomes: &[ProbeOutcome], default_suffix: &str) -> Option<String> {
    let suffix = format!(".{}", default_suffix);
    outcomes
        .iter()
        .map(|o| o.record.name.as_str())
        .find(|name| name.to_ascii_lowercase().ends_with(&suffix))
        .map(|name| name.to_string())
}

/// Tri-state aggregation: enabled once any domain says so; disabled
/// needs a negative report with more than one domain probed; a lone
/// negative stays non-conclusive.
fn aggregate_desktop_sso(outcomes: &[ProbeOutcome]) -> DesktopSsoState {
    if outcomes.iter().any(|o| o.desktop_sso == Some(true)) {
        DesktopSsoState::Enabled
    } else if outcomes.len() > 1 && outcomes.iter().any(|o| o.desktop_sso == Some(false)) {
        DesktopSsoState::Disabled
    } else {
        DesktopSsoState::Unknown
    }
}

fn extract_tenant_id(openid: &OpenIdConfiguration) -> Option<String> {
    openid
        .token_endpoint
        .as_deref()
        .and_then(|e| TENANT_ID_RE.find(e))
        .or_else(|| openid.issuer.as_deref().and_then(|i| TENANT_ID_RE.find(i)))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Pull the domain list out of the federation-information response,
/// deduplicated in document order
fn extract_domains(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    DOMAIN_ELEMENT_RE
        .captures_iter(body)
        .map(|c| c[1].trim().to_string())
        .filter(|d| !d.is_empty() && seen.insert(d.to_ascii_lowercase()))
        .collect()
}

fn federation_information_request(domain: &str, endpoint: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:a="http://www.w3.org/2005/08/addressing" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <a:Action soap:mustUnderstand="1">http://schemas.microsoft.com/exchange/2010/Autodiscover/Autodiscover/GetFederationInformation</a:Action>
    <a:To soap:mustUnderstand="1">{endpoint}</a:To>
    <a:ReplyTo>
      <a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address>
    </a:ReplyTo>
  </soap:Header>
  <soap:Body>
    <GetFederationInformationRequestMessage xmlns="http://schemas.microsoft.com/exchange/2010/Autodiscover">
      <Request>
        <Domain>{domain}</Domain>
      </Request>
    </GetFederationInformationRequestMessage>
  </soap:Body>
</soap:Envelope>"#
    )
}
