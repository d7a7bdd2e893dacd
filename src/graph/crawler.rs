// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Directory Graph Crawler
 * Policy-bounded traversal of the organizational graph
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::errors::{ReconError, ReconResult};
use crate::graph::client::{DirectoryClient, GraphObject};
use crate::types::{
    CrawlResult, DirectoryObject, ObjectKind, RelationEdge, RelationKind, SeedSpec,
    TraversalPolicy,
};
use tracing::{debug, info, warn};

/// Crawls the membership/ownership/management/role graph from a seed
/// node. The result maps are owned exclusively by one invocation and
/// passed by exclusive reference through each phase.
pub struct DirectoryCrawler {
    client: DirectoryClient,
}

impl DirectoryCrawler {
    pub fn new(client: DirectoryClient) -> Self {
        Self { client }
    }

    pub async fn crawl(&self, seed: &SeedSpec, policy: &TraversalPolicy) -> ReconResult<CrawlResult> {
        info!(seed = %seed, "Starting directory crawl");

        let mut result = CrawlResult::new();

        match seed {
            SeedSpec::GroupId(group_id) => {
                self.crawl_group_rooted(group_id, policy, &mut result).await?;
            }
            SeedSpec::UserPrincipal(principal) => {
                self.crawl_user_rooted(principal, policy, &mut result).await?;
            }
        }

        info!(
            "[SUCCESS] Crawl complete: {} users, {} groups, {} roles ({} sub-fetches skipped)",
            result.users.len(),
            result.groups.len(),
            result.roles.len(),
            result.skipped_fetches.len()
        );

        Ok(result)
    }

    /// Group-rooted mode: one bounded fan-out over the group's member
    /// list. No further expansion; the group map stays empty.
    async fn crawl_group_rooted(
        &self,
        group_id: &str,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        // Seed path: any failure here is fatal
        let members = self
            .client
            .fetch_all(
                &format!("/groups/{}/members", group_id),
                policy.max_results_per_collection,
            )
            .await?;

        debug!(group = group_id, members = members.len(), "Seed group resolved");

        for member in members {
            let mut user = member.into_directory_object(ObjectKind::User);
            user.add_relation(RelationEdge {
                from_id: user.id.clone(),
                to_id: group_id.to_string(),
                kind: RelationKind::MemberOf,
            });
            result.merge(user);
        }

        Ok(())
    }

    /// User-rooted mode: four policy-gated expansion phases over the
    /// shared object maps
    async fn crawl_user_rooted(
        &self,
        principal: &str,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        // Seed path: resolution failure is fatal
        let seed = self.client.get_object(&format!("/users/{}", principal)).await?;
        let seed_user = seed.into_directory_object(ObjectKind::User);
        let seed_id = seed_user.id.clone();
        result.merge(seed_user);

        if policy.include_subordinates {
            self.expand_subordinates(policy, result).await?;
        }

        if policy.include_manager {
            self.expand_manager(&seed_id, result).await?;
        }

        if policy.include_groups || policy.include_group_members {
            self.expand_groups(policy, result).await?;
        }

        if policy.include_roles {
            self.expand_roles(policy, result).await?;
        }

        Ok(())
    }

    /// Phase 1: direct reports, one hop from every user present at
    /// phase start. The snapshot keeps the growing map from feeding
    /// the loop.
    async fn expand_subordinates(
        &self,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        let snapshot: Vec<String> = result.users.keys().cloned().collect();
        debug!(users = snapshot.len(), "Expanding direct reports");

        for user_id in snapshot {
            let path = format!("/users/{}/directReports", user_id);
            let reports = match self
                .try_fetch(&path, policy.max_results_per_collection, "subordinates", result)
                .await?
            {
                Some(reports) => reports,
                None => continue,
            };

            for report in reports {
                let mut subordinate = report.into_directory_object(ObjectKind::User);
                subordinate.add_relation(RelationEdge {
                    from_id: user_id.clone(),
                    to_id: subordinate.id.clone(),
                    kind: RelationKind::ManagerOf,
                });
                result.merge(subordinate);
            }
        }

        Ok(())
    }

    /// Phase 2: the seed user's manager. Absence is normal and never
    /// fails the crawl.
    async fn expand_manager(&self, seed_id: &str, result: &mut CrawlResult) -> ReconResult<()> {
        let path = format!("/users/{}/manager", seed_id);

        match self.client.get_object_optional(&path).await {
            Ok(Some(object)) => {
                let mut manager = object.into_directory_object(ObjectKind::User);
                manager.add_relation(RelationEdge {
                    from_id: manager.id.clone(),
                    to_id: seed_id.to_string(),
                    kind: RelationKind::ManagerOf,
                });
                result.merge(manager);
            }
            Ok(None) => debug!(user = seed_id, "Seed user has no manager"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(user = seed_id, error = %err, "Manager lookup failed, continuing");
                result.record_skip(format!("manager:{}", seed_id));
            }
        }

        Ok(())
    }

    /// Phase 3: group memberships for every known user; optionally the
    /// member/owner lists of every discovered group
    async fn expand_groups(
        &self,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        let snapshot: Vec<String> = result.users.keys().cloned().collect();
        debug!(users = snapshot.len(), "Expanding group memberships");

        for user_id in &snapshot {
            let path = format!("/users/{}/memberOf", user_id);
            let memberships = match self
                .try_fetch(&path, policy.max_results_per_collection, "groups", result)
                .await?
            {
                Some(memberships) => memberships,
                None => continue,
            };

            for membership in memberships {
                // Role memberships are handled in the roles phase
                if membership.kind() != Some(ObjectKind::Group) {
                    continue;
                }

                let mut group = membership.into_directory_object(ObjectKind::Group);
                group.add_relation(RelationEdge {
                    from_id: user_id.clone(),
                    to_id: group.id.clone(),
                    kind: RelationKind::MemberOf,
                });
                result.merge(group);
            }
        }

        if policy.include_group_members {
            self.expand_group_members(policy, result).await?;
        }

        Ok(())
    }

    /// Resolve member and owner lists for every discovered group,
    /// annotating each group at most once
    async fn expand_group_members(
        &self,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        let group_ids: Vec<String> = result.groups.keys().cloned().collect();
        debug!(groups = group_ids.len(), "Resolving group member lists");

        for group_id in &group_ids {
            let already_annotated = result
                .groups
                .get(group_id)
                .map(|g| g.is_annotated())
                .unwrap_or(false);
            if already_annotated {
                continue;
            }

            let members = self
                .try_fetch(
                    &format!("/groups/{}/members", group_id),
                    policy.max_results_per_collection,
                    "group-members",
                    result,
                )
                .await?;

            let owners = self
                .try_fetch(
                    &format!("/groups/{}/owners", group_id),
                    policy.max_results_per_collection,
                    "group-owners",
                    result,
                )
                .await?;

            let member_names = members.map(|members| {
                let mut names = Vec::with_capacity(members.len());
                for member in members {
                    let mut user = member.into_directory_object(ObjectKind::User);
                    user.add_relation(RelationEdge {
                        from_id: user.id.clone(),
                        to_id: group_id.clone(),
                        kind: RelationKind::MemberOf,
                    });
                    names.push(user.display_name.clone());
                    result.merge(user);
                }
                names
            });

            let owner_names = owners.map(|owners| {
                let mut names = Vec::with_capacity(owners.len());
                for owner in owners {
                    let mut user = owner.into_directory_object(ObjectKind::User);
                    user.add_relation(RelationEdge {
                        from_id: user.id.clone(),
                        to_id: group_id.clone(),
                        kind: RelationKind::OwnerOf,
                    });
                    names.push(user.display_name.clone());
                    result.merge(user);
                }
                names
            });

            if let Some(group) = result.groups.get_mut(group_id) {
                if !group.is_annotated() {
                    group.members = member_names;
                    group.owners = owner_names;
                }
            }
        }

        Ok(())
    }

    /// Phase 4: directory-role memberships for every known user, then
    /// a best-effort authoritative member list per role
    async fn expand_roles(
        &self,
        policy: &TraversalPolicy,
        result: &mut CrawlResult,
    ) -> ReconResult<()> {
        let snapshot: Vec<(String, String)> = result
            .users
            .iter()
            .map(|(id, user)| (id.clone(), user.label().to_string()))
            .collect();
        debug!(users = snapshot.len(), "Expanding role memberships");

        for (user_id, user_label) in &snapshot {
            let path = format!("/users/{}/memberOf", user_id);
            let memberships = match self
                .try_fetch(&path, policy.max_results_per_collection, "role-memberships", result)
                .await?
            {
                Some(memberships) => memberships,
                None => continue,
            };

            for membership in memberships {
                if membership.kind() != Some(ObjectKind::Role) {
                    continue;
                }

                let role_id = membership.id.clone();
                let mut role = membership.into_directory_object(ObjectKind::Role);
                role.add_relation(RelationEdge {
                    from_id: user_id.clone(),
                    to_id: role_id.clone(),
                    kind: RelationKind::HasRole,
                });
                result.merge(role);

                // Append-only accumulation; the membership fetch
                // already returns distinct users per role
                if let Some(role) = result.roles.get_mut(&role_id) {
                    role.members
                        .get_or_insert_with(Vec::new)
                        .push(user_label.clone());
                }
            }
        }

        // Second pass: the authoritative member list commonly needs
        // privileges we may not hold; failure keeps the accumulated
        // list for that role.
        let role_ids: Vec<String> = result.roles.keys().cloned().collect();
        for role_id in &role_ids {
            let path = format!("/directoryRoles/{}/members", role_id);
            match self
                .client
                .fetch_all(&path, policy.max_results_per_collection)
                .await
            {
                Ok(members) => {
                    let names: Vec<String> =
                        members.into_iter().map(object_label).collect();
                    if let Some(role) = result.roles.get_mut(role_id) {
                        let list = role.members.get_or_insert_with(Vec::new);
                        // Union with de-duplication: accumulated
                        // evidence stays, authoritative entries fill
                        // the gaps
                        for name in names {
                            if !list.contains(&name) {
                                list.push(name);
                            }
                        }
                    }
                }
                Err(err) => {
                    debug!(role = %role_id, error = %err, "Role member list unavailable, keeping accumulated members");
                    result.record_skip(format!("role-members:{}", role_id));
                }
            }
        }

        Ok(())
    }

    /// Fetch a collection, degrading local failures: a missing object
    /// is an empty page, a fatal error propagates, anything else is
    /// recorded as skipped and yields `None`.
    async fn try_fetch(
        &self,
        path: &str,
        cap: usize,
        what: &str,
        result: &mut CrawlResult,
    ) -> ReconResult<Option<Vec<GraphObject>>> {
        match self.client.fetch_all(path, cap).await {
            Ok(objects) => Ok(Some(objects)),
            Err(ReconError::NotFound { .. }) => Ok(Some(Vec::new())),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(resource = path, error = %err, "Sub-fetch failed, skipping");
                result.record_skip(format!("{}:{}", what, path));
                Ok(None)
            }
        }
    }
}

fn object_label(object: GraphObject) -> String {
    object
        .user_principal_name
        .or(object.display_name)
        .unwrap_or(object.id)
}
