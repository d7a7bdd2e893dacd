// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a directory object discovered during a crawl
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    User,
    Group,
    Role,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::User => write!(f, "user"),
            ObjectKind::Group => write!(f, "group"),
            ObjectKind::Role => write!(f, "role"),
        }
    }
}

/// Relation between two directory objects, discovered during expansion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    MemberOf,
    OwnerOf,
    ManagerOf,
    HasRole,
}

/// A discovered edge in the organizational graph. Edges annotate
/// objects as they are merged; they are not stored independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelationEdge {
    pub from_id: String,
    pub to_id: String,
    pub kind: RelationKind,
}

/// A single node in the directory graph. Identity is `id`; uniqueness
/// is enforced by the map that owns the object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    pub id: String,
    pub kind: ObjectKind,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(default)]
    pub relations: Vec<RelationEdge>,
    /// Resolved member name list. `None` until annotated; written at
    /// most once per traversal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    /// Resolved owner name list, same write-once discipline as `members`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,
}

impl DirectoryObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            principal_name: None,
            relations: Vec::new(),
            members: None,
            owners: None,
        }
    }

    pub fn with_principal_name(mut self, principal_name: impl Into<String>) -> Self {
        self.principal_name = Some(principal_name.into());
        self
    }

    /// Best display label: principal name when present, display name otherwise
    pub fn label(&self) -> &str {
        self.principal_name.as_deref().unwrap_or(&self.display_name)
    }

    /// Record a relation edge, skipping exact duplicates
    pub fn add_relation(&mut self, edge: RelationEdge) {
        if !self.relations.contains(&edge) {
            self.relations.push(edge);
        }
    }

    /// Whether the members/owners annotation has already been applied
    pub fn is_annotated(&self) -> bool {
        self.members.is_some() || self.owners.is_some()
    }
}

/// Federation classification from realm discovery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FederationType {
    Managed,
    Federated,
    Unknown,
}

impl Default for FederationType {
    fn default() -> Self {
        FederationType::Unknown
    }
}

impl std::fmt::Display for FederationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FederationType::Managed => write!(f, "managed"),
            FederationType::Federated => write!(f, "federated"),
            FederationType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-domain probe verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub name: String,
    pub dns_exists: bool,
    pub has_cloud_mx: bool,
    pub has_cloud_spf: bool,
    pub federation: FederationType,
    /// Token-issuing endpoint host. Non-empty exactly when `federation`
    /// is `Federated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts_host: Option<String>,
}

/// Desktop single-sign-on capability verdict for a tenant. A lone
/// domain reporting `false` is non-conclusive and stays `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DesktopSsoState {
    Enabled,
    Disabled,
    Unknown,
}

impl Default for DesktopSsoState {
    fn default() -> Self {
        DesktopSsoState::Unknown
    }
}

impl std::fmt::Display for DesktopSsoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopSsoState::Enabled => write!(f, "enabled"),
            DesktopSsoState::Disabled => write!(f, "disabled"),
            DesktopSsoState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggregated tenant identity plus the per-domain signal table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    pub desktop_sso: DesktopSsoState,
    /// Domain records in input order
    pub domains: Vec<DomainRecord>,
}

/// Boolean switches controlling which relation dimensions a crawl
/// expands, plus the per-collection merge cap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalPolicy {
    #[serde(default = "default_true")]
    pub include_groups: bool,

    #[serde(default)]
    pub include_group_members: bool,

    #[serde(default)]
    pub include_roles: bool,

    #[serde(default)]
    pub include_manager: bool,

    #[serde(default)]
    pub include_subordinates: bool,

    #[serde(default = "default_max_results")]
    pub max_results_per_collection: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    1000
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            include_groups: true,
            include_group_members: false,
            include_roles: false,
            include_manager: false,
            include_subordinates: false,
            max_results_per_collection: 1000,
        }
    }
}

impl TraversalPolicy {
    pub fn with_groups(mut self, enabled: bool) -> Self {
        self.include_groups = enabled;
        self
    }

    pub fn with_group_members(mut self, enabled: bool) -> Self {
        self.include_group_members = enabled;
        self
    }

    pub fn with_roles(mut self, enabled: bool) -> Self {
        self.include_roles = enabled;
        self
    }

    pub fn with_manager(mut self, enabled: bool) -> Self {
        self.include_manager = enabled;
        self
    }

    pub fn with_subordinates(mut self, enabled: bool) -> Self {
        self.include_subordinates = enabled;
        self
    }

    pub fn with_max_results(mut self, cap: usize) -> Self {
        self.max_results_per_collection = cap;
        self
    }
}

/// Starting node of a crawl
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SeedSpec {
    UserPrincipal(String),
    GroupId(String),
}

impl std::fmt::Display for SeedSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedSpec::UserPrincipal(upn) => write!(f, "user:{}", upn),
            SeedSpec::GroupId(id) => write!(f, "group:{}", id),
        }
    }
}

/// Deduplicated object maps produced by a single crawl invocation.
/// Ordered maps keep serialized output deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub users: BTreeMap<String, DirectoryObject>,
    pub groups: BTreeMap<String, DirectoryObject>,
    pub roles: BTreeMap<String, DirectoryObject>,
    /// Sub-fetches skipped after local failure, for the verbose channel
    #[serde(default)]
    pub skipped_fetches: Vec<String>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an object into its collection. Idempotent on id: an
    /// already-known object keeps its fields and only gains relation
    /// edges. Returns true when the object was newly inserted.
    pub fn merge(&mut self, object: DirectoryObject) -> bool {
        let map = match object.kind {
            ObjectKind::User => &mut self.users,
            ObjectKind::Group => &mut self.groups,
            ObjectKind::Role => &mut self.roles,
        };

        match map.get_mut(&object.id) {
            Some(existing) => {
                for edge in object.relations {
                    existing.add_relation(edge);
                }
                false
            }
            None => {
                map.insert(object.id.clone(), object);
                true
            }
        }
    }

    pub fn record_skip(&mut self, what: impl Into<String>) {
        self.skipped_fetches.push(what.into());
    }

    pub fn total_objects(&self) -> usize {
        self.users.len() + self.groups.len() + self.roles.len()
    }
}
