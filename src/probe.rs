// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - DNS/Federation Domain Probe
 * Multi-source per-domain signal collection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::config::ReconConfig;
use crate::errors::{ReconError, ReconResult};
use crate::realm::RealmClient;
use crate::types::{DomainRecord, FederationType};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use tracing::debug;

/// Everything a single domain probe learns. The tenant collector
/// aggregates `brand` and `desktop_sso` across domains; only `record`
/// lands in the domain table.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub record: DomainRecord,
    pub brand: Option<String>,
    pub desktop_sso: Option<bool>,
}

/// Per-domain prober. Probes are independent and safe to run
/// concurrently; failures degrade the record to defaults instead of
/// propagating.
pub struct DomainProbe {
    resolver: TokioResolver,
    realm: RealmClient,
    cloud_mx_suffix: String,
    cloud_spf_marker: String,
}

impl DomainProbe {
    pub fn new(config: &ReconConfig) -> ReconResult<Self> {
        let resolver = TokioResolver::builder(TokioConnectionProvider::default())
            .map_err(|e| ReconError::Configuration(format!("Failed to create resolver: {}", e)))?
            .build();

        let realm = RealmClient::new(&config.endpoints, &config.network)?;

        Ok(Self {
            resolver,
            realm,
            cloud_mx_suffix: config.endpoints.cloud_mx_suffix.clone(),
            cloud_spf_marker: config.endpoints.cloud_spf_marker.clone(),
        })
    }

    /// Probe a single domain across DNS, mail delegation, federation
    /// and desktop-SSO dimensions
    pub async fn probe(&self, domain: &str) -> ProbeOutcome {
        let (dns_exists, mx_records, txt_records) = self.resolve_domain(domain).await;

        // No DNS records short-circuits the delegation checks
        let has_cloud_mx = dns_exists && mx_indicates_cloud(&mx_records, &self.cloud_mx_suffix);
        let has_cloud_spf = dns_exists && spf_indicates_cloud(&txt_records, &self.cloud_spf_marker);

        let (federation, sts_host, brand) = match self.realm.get_user_realm(domain).await {
            Ok(realm) => {
                let brand = realm.brand();
                match realm.federation_type() {
                    FederationType::Federated => match realm.sts_host() {
                        Some(host) => (FederationType::Federated, Some(host), brand),
                        // Federated without a usable auth endpoint cannot
                        // satisfy the sts-host invariant
                        None => (FederationType::Unknown, None, brand),
                    },
                    other => (other, None, brand),
                }
            }
            Err(e) => {
                debug!(domain = domain, error = %e, "Realm discovery failed");
                (FederationType::Unknown, None, None)
            }
        };

        let desktop_sso = match self.realm.desktop_sso_enabled(domain).await {
            Ok(verdict) => verdict,
            Err(e) => {
                debug!(domain = domain, error = %e, "Desktop-SSO lookup failed");
                None
            }
        };

        debug!(
            domain = domain,
            dns = dns_exists,
            mx = has_cloud_mx,
            spf = has_cloud_spf,
            federation = %federation,
            "Domain probe complete"
        );

        ProbeOutcome {
            record: DomainRecord {
                name: domain.to_string(),
                dns_exists,
                has_cloud_mx,
                has_cloud_spf,
                federation,
                sts_host,
            },
            brand,
            desktop_sso,
        }
    }

    /// Resolve A/AAAA, MX and TXT for the domain. Any successful
    /// lookup marks the domain as existing; failures are recorded, not
    /// propagated.
    async fn resolve_domain(&self, domain: &str) -> (bool, Vec<String>, Vec<String>) {
        let has_address = match self.resolver.lookup_ip(domain).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                debug!(domain = domain, error = %e, "Address lookup failed");
                false
            }
        };

        let mx_records: Vec<String> = self
            .resolver
            .mx_lookup(domain)
            .await
            .ok()
            .map(|mx| mx.iter().map(|r| r.exchange().to_string()).collect())
            .unwrap_or_default();

        let txt_records: Vec<String> = self
            .resolver
            .txt_lookup(domain)
            .await
            .ok()
            .map(|txt| {
                txt.iter()
                    .flat_map(|r| r.iter())
                    .map(|data| String::from_utf8_lossy(data).to_string())
                    .collect()
            })
            .unwrap_or_default();

        let dns_exists = has_address || !mx_records.is_empty() || !txt_records.is_empty();
        (dns_exists, mx_records, txt_records)
    }
}

/// Whether any MX exchange points at the cloud mail service
fn mx_indicates_cloud(mx_records: &[String], suffix: &str) -> bool {
    mx_records
        .iter()
        .any(|mx| mx.trim_end_matches('.').to_ascii_lowercase().ends_with(suffix))
}

/// Whether the SPF record delegates to the cloud sender infrastructure
fn spf_indicates_cloud(txt_records: &[String], marker: &str) -> bool {
    txt_records
        .iter()
        .any(|txt| txt.starts_with("v=spf1") && txt.contains(marker))
}
