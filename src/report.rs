// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Result Aggregation
 * Summary views over crawl and tenant results
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{CrawlResult, FederationType, SeedSpec, TenantProfile};
use chrono::Utc;
use serde::Serialize;

/// Summary counts for a completed crawl. Pure view over the result;
/// the full structured object stays available for export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub seed: String,
    pub user_count: usize,
    pub group_count: usize,
    pub role_count: usize,
    pub annotated_groups: usize,
    pub skipped_fetches: usize,
    pub generated_at: String,
}

impl CrawlSummary {
    pub fn new(seed: &SeedSpec, result: &CrawlResult) -> Self {
        Self {
            seed: seed.to_string(),
            user_count: result.users.len(),
            group_count: result.groups.len(),
            role_count: result.roles.len(),
            annotated_groups: result.groups.values().filter(|g| g.is_annotated()).count(),
            skipped_fetches: result.skipped_fetches.len(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

impl std::fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Crawl summary for {}", self.seed)?;
        writeln!(f, "  Users:  {}", self.user_count)?;
        writeln!(f, "  Groups: {} ({} annotated)", self.group_count, self.annotated_groups)?;
        writeln!(f, "  Roles:  {}", self.role_count)?;
        write!(f, "  Skipped sub-fetches: {}", self.skipped_fetches)
    }
}

/// Summary counts for a tenant domain reconnaissance run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub tenant_id: String,
    pub brand_name: Option<String>,
    pub canonical_name: Option<String>,
    pub desktop_sso: String,
    pub domain_count: usize,
    pub resolving_domains: usize,
    pub cloud_mx_domains: usize,
    pub cloud_spf_domains: usize,
    pub federated_domains: usize,
    pub managed_domains: usize,
    pub generated_at: String,
}

impl TenantSummary {
    pub fn new(profile: &TenantProfile) -> Self {
        Self {
            tenant_id: profile.tenant_id.clone(),
            brand_name: profile.brand_name.clone(),
            canonical_name: profile.canonical_name.clone(),
            desktop_sso: profile.desktop_sso.to_string(),
            domain_count: profile.domains.len(),
            resolving_domains: profile.domains.iter().filter(|d| d.dns_exists).count(),
            cloud_mx_domains: profile.domains.iter().filter(|d| d.has_cloud_mx).count(),
            cloud_spf_domains: profile.domains.iter().filter(|d| d.has_cloud_spf).count(),
            federated_domains: profile
                .domains
                .iter()
                .filter(|d| d.federation == FederationType::Federated)
                .count(),
            managed_domains: profile
                .domains
                .iter()
                .filter(|d| d.federation == FederationType::Managed)
                .count(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

impl std::fmt::Display for TenantSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tenant {}", self.tenant_id)?;
        if let Some(brand) = &self.brand_name {
            writeln!(f, "  Brand: {}", brand)?;
        }
        if let Some(canonical) = &self.canonical_name {
            writeln!(f, "  Canonical name: {}", canonical)?;
        }
        writeln!(f, "  Desktop SSO: {}", self.desktop_sso)?;
        writeln!(
            f,
            "  Domains: {} ({} resolving, {} cloud MX, {} cloud SPF)",
            self.domain_count, self.resolving_domains, self.cloud_mx_domains, self.cloud_spf_domains
        )?;
        write!(
            f,
            "  Federation: {} federated, {} managed",
            self.federated_domains, self.managed_domains
        )
    }
}
