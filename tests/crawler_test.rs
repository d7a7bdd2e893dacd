// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Directory Crawler Tests
 * Policy gating, pagination, merge and degradation behavior
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use luotain_recon::auth::StaticTokenProvider;
use luotain_recon::config::ReconConfig;
use luotain_recon::errors::ReconError;
use luotain_recon::graph::{DirectoryClient, DirectoryCrawler};
use luotain_recon::types::{RelationKind, SeedSpec, TraversalPolicy};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> ReconConfig {
    ReconConfig::default().with_graph_base(server.uri())
}

fn crawler_for(server: &MockServer) -> DirectoryCrawler {
    crawler_with_config(test_config(server))
}

fn crawler_with_config(config: ReconConfig) -> DirectoryCrawler {
    let provider = Arc::new(StaticTokenProvider::new("test-token"));
    let client = DirectoryClient::new(&config, provider).unwrap();
    DirectoryCrawler::new(client)
}

fn user_json(id: &str, display: &str, upn: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.user",
        "id": id,
        "displayName": display,
        "userPrincipalName": upn,
    })
}

fn group_json(id: &str, display: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.group",
        "id": id,
        "displayName": display,
    })
}

fn role_json(id: &str, display: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.directoryRole",
        "id": id,
        "displayName": display,
    })
}

fn page(values: Vec<Value>) -> Value {
    json!({ "value": values })
}

async fn mount_seed_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/alice@contoso.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_json("u-alice", "Alice Agnesi", "alice@contoso.com")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_groups_only_policy_collects_groups_without_annotation() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            group_json("g-1", "Engineering"),
            group_json("g-2", "Helsinki Office"),
            role_json("r-admin", "Global Administrator"),
        ])))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default();
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    assert_eq!(result.users.len(), 1);
    assert!(result.users.contains_key("u-alice"));
    assert_eq!(result.groups.len(), 2);
    assert!(result.groups.contains_key("g-1"));
    assert!(result.groups.contains_key("g-2"));
    // Role memberships are not collected without the roles dimension
    assert!(result.roles.is_empty());
    // GroupMembers disabled: no annotation on either group
    assert!(result.groups["g-1"].members.is_none());
    assert!(result.groups["g-2"].members.is_none());
    assert!(result.skipped_fetches.is_empty());
}

#[tokio::test]
async fn test_group_rooted_mode_is_shallow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/g-eng/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            user_json("u-bob", "Bob Berwick", "bob@contoso.com"),
            user_json("u-carol", "Carol Chandra", "carol@contoso.com"),
        ])))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::GroupId("g-eng".to_string());

    let result = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap();

    assert_eq!(result.users.len(), 2);
    assert!(result.users.contains_key("u-bob"));
    assert!(result.users.contains_key("u-carol"));
    // Group-rooted mode never populates the group map itself
    assert!(result.groups.is_empty());
    assert!(result.roles.is_empty());

    let bob = &result.users["u-bob"];
    assert!(bob
        .relations
        .iter()
        .any(|e| e.kind == RelationKind::MemberOf && e.to_id == "g-eng"));
}

#[tokio::test]
async fn test_pagination_follows_continuation_link() {
    let server = MockServer::start().await;

    let page_two = format!("{}/groups/g-big/members?page=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/groups/g-big/members"))
        .and(query_param("$top", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [user_json("u-1", "One", "one@contoso.com")],
            "@odata.nextLink": page_two,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups/g-big/members"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![user_json("u-2", "Two", "two@contoso.com")])),
        )
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::GroupId("g-big".to_string());

    let result = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap();

    assert_eq!(result.users.len(), 2);
    assert!(result.users.contains_key("u-1"));
    assert!(result.users.contains_key("u-2"));
}

#[tokio::test]
async fn test_result_cap_bounds_collection() {
    let server = MockServer::start().await;

    // A page that always advertises a continuation; the cap must stop
    // the loop anyway
    let next = format!("{}/groups/g-loop/members?page=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/groups/g-loop/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                user_json("u-a", "A", "a@contoso.com"),
                user_json("u-b", "B", "b@contoso.com"),
            ],
            "@odata.nextLink": next,
        })))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::GroupId("g-loop".to_string());
    let policy = TraversalPolicy::default().with_max_results(2);

    let result = crawler.crawl(&seed, &policy).await.unwrap();
    assert_eq!(result.users.len(), 2);
}

#[tokio::test]
async fn test_crawl_twice_yields_identical_results() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            group_json("g-1", "Engineering"),
            group_json("g-2", "Helsinki Office"),
        ])))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default();
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let first = crawler.crawl(&seed, &policy).await.unwrap();
    let second = crawler.crawl(&seed, &policy).await.unwrap();

    let first_users: Vec<&String> = first.users.keys().collect();
    let second_users: Vec<&String> = second.users.keys().collect();
    assert_eq!(first_users, second_users);

    let first_groups: Vec<&String> = first.groups.keys().collect();
    let second_groups: Vec<&String> = second.groups.keys().collect();
    assert_eq!(first_groups, second_groups);
}

#[tokio::test]
async fn test_group_member_annotation_applied_exactly_once() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![group_json("g-1", "Engineering")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups/g-1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            user_json("u-alice", "Alice Agnesi", "alice@contoso.com"),
            user_json("u-bob", "Bob Berwick", "bob@contoso.com"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups/g-1/owners"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![user_json("u-carol", "Carol Chandra", "carol@contoso.com")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default().with_group_members(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    // Members and owners merged into the user map
    assert_eq!(result.users.len(), 3);
    assert!(result.users.contains_key("u-bob"));
    assert!(result.users.contains_key("u-carol"));

    let group = &result.groups["g-1"];
    assert_eq!(
        group.members.as_deref(),
        Some(&["Alice Agnesi".to_string(), "Bob Berwick".to_string()][..])
    );
    assert_eq!(
        group.owners.as_deref(),
        Some(&["Carol Chandra".to_string()][..])
    );

    let carol = &result.users["u-carol"];
    assert!(carol
        .relations
        .iter()
        .any(|e| e.kind == RelationKind::OwnerOf && e.to_id == "g-1"));
}

#[tokio::test]
async fn test_subordinate_expansion_is_single_hop() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/directReports"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![user_json("u-bob", "Bob Berwick", "bob@contoso.com")])),
        )
        .mount(&server)
        .await;

    // Bob was discovered during the phase, so his reports are not
    // fetched in the same pass
    Mock::given(method("GET"))
        .and(path("/users/u-bob/directReports"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![user_json("u-dave", "Dave", "dave@contoso.com")])),
        )
        .expect(0)
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default()
        .with_groups(false)
        .with_subordinates(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    assert_eq!(result.users.len(), 2);
    assert!(result.users.contains_key("u-bob"));
    assert!(!result.users.contains_key("u-dave"));

    let bob = &result.users["u-bob"];
    assert!(bob
        .relations
        .iter()
        .any(|e| e.kind == RelationKind::ManagerOf && e.from_id == "u-alice"));
}

#[tokio::test]
async fn test_missing_manager_is_swallowed() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/manager"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default()
        .with_groups(false)
        .with_manager(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    assert_eq!(result.users.len(), 1);
    assert!(result.skipped_fetches.is_empty());
}

#[tokio::test]
async fn test_manager_merged_with_relation() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/manager"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_json("u-meri", "Meri Manager", "meri@contoso.com")),
        )
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default()
        .with_groups(false)
        .with_manager(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    let manager = &result.users["u-meri"];
    assert!(manager
        .relations
        .iter()
        .any(|e| e.kind == RelationKind::ManagerOf && e.to_id == "u-alice"));
}

#[tokio::test]
async fn test_unauthorized_seed_aborts_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice@contoso.com"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let err = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_unauthorized_expansion_aborts_crawl() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let err = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_forbidden_role_member_list_keeps_accumulated_members() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![role_json("r-admin", "Global Administrator")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/directoryRoles/r-admin/members"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default()
        .with_groups(false)
        .with_roles(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    let role = &result.roles["r-admin"];
    assert_eq!(
        role.members.as_deref(),
        Some(&["alice@contoso.com".to_string()][..])
    );
    assert!(result
        .skipped_fetches
        .iter()
        .any(|s| s == "role-members:r-admin"));
}

#[tokio::test]
async fn test_authoritative_role_members_union_without_duplicates() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![role_json("r-admin", "Global Administrator")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/directoryRoles/r-admin/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            user_json("u-alice", "Alice Agnesi", "alice@contoso.com"),
            user_json("u-dave", "Dave Dijkstra", "dave@contoso.com"),
        ])))
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let policy = TraversalPolicy::default()
        .with_groups(false)
        .with_roles(true);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler.crawl(&seed, &policy).await.unwrap();

    let role = &result.roles["r-admin"];
    assert_eq!(
        role.members.as_deref(),
        Some(&["alice@contoso.com".to_string(), "dave@contoso.com".to_string()][..])
    );
    assert!(result.skipped_fetches.is_empty());
}

#[tokio::test]
async fn test_rate_limited_subfetch_is_skipped_after_retries() {
    let server = MockServer::start().await;
    mount_seed_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/u-alice/memberOf"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    // Single attempt keeps the test free of backoff sleeps
    config.crawler.max_retries = 1;

    let crawler = crawler_with_config(config);
    let seed = SeedSpec::UserPrincipal("alice@contoso.com".to_string());

    let result = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap();

    assert_eq!(result.users.len(), 1);
    assert!(result.groups.is_empty());
    assert!(result
        .skipped_fetches
        .iter()
        .any(|s| s.starts_with("groups:")));
}

#[tokio::test]
async fn test_rate_limit_retry_honors_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/g-eng/members"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups/g-eng/members"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![user_json("u-bob", "Bob Berwick", "bob@contoso.com")])),
        )
        .mount(&server)
        .await;

    let crawler = crawler_for(&server);
    let seed = SeedSpec::GroupId("g-eng".to_string());

    let result = crawler
        .crawl(&seed, &TraversalPolicy::default())
        .await
        .unwrap();

    assert_eq!(result.users.len(), 1);
}
