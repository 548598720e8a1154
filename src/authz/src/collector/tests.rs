//! Collector tests covering every strategy and the association walk

use super::*;
use crate::error::AuthzError;
use crate::policy::InMemoryPolicyStore;
use crate::resource::{InMemoryResourceStore, Scope};

const RS: &str = "rs";

fn roles(ids: &[&str]) -> HashSet<RoleId> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn ids(resources: &[Resource]) -> Vec<&str> {
    resources.iter().map(|r| r.id.as_str()).collect()
}

struct Fixture {
    policies: Arc<InMemoryPolicyStore>,
    resources: Arc<InMemoryResourceStore>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            policies: Arc::new(InMemoryPolicyStore::new()),
            resources: Arc::new(InMemoryResourceStore::new()),
        }
    }

    fn resource(&self, resource: Resource) -> Resource {
        self.resources.put(resource.clone());
        resource
    }

    async fn policy(&self, policy: Policy) {
        self.policies.put(policy).await;
    }

    async fn role_policy(&self, id: &str, role_ids: &[&str]) {
        self.policy(Policy::new(id, id, PolicyCategory::Role, RS).with_roles(role_ids.iter().copied()))
            .await;
    }

    fn collector(&self) -> ResourceCollector {
        ResourceCollector::new(self.policies.clone(), self.resources.clone())
    }
}

fn server() -> ResourceServer {
    ResourceServer::new(RS)
}

// ============================================================================
// Direct
// ============================================================================

#[tokio::test]
async fn test_direct_grants_only_matching_roles() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(rx),
    )
    .await;

    let collector = fx.collector();
    let granted = collector
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&granted), vec!["rx"]);

    let denied = collector
        .collect(&server(), &roles(&["B"]), &Strategy::Direct)
        .await
        .unwrap();
    assert!(denied.is_empty());
}

#[tokio::test]
async fn test_union_collapses_duplicates_in_first_seen_order() {
    let fx = Fixture::new();
    let r1 = fx.resource(Resource::new("r1", "R1", RS));
    let r2 = fx.resource(Resource::new("r2", "R2", RS));
    let r3 = fx.resource(Resource::new("r3", "R3", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p1", "P1", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(r2.clone())
            .with_resource(r1.clone()),
    )
    .await;
    fx.policy(
        Policy::new("p2", "P2", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(r1)
            .with_resource(r3),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["r2", "r1", "r3"]);
}

#[tokio::test]
async fn test_non_role_associated_policies_are_ignored() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    // Carries a roles entry but is not a role policy
    fx.policy(Policy::new("time", "time", PolicyCategory::Other, RS).with_roles(["A"]))
        .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("time")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert!(collected.is_empty());
}

#[tokio::test]
async fn test_role_policy_without_roles_entry_never_grants() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.policy(Policy::new("empty", "empty", PolicyCategory::Role, RS)).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("empty")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert!(collected.is_empty());
}

// ============================================================================
// Scope expansion
// ============================================================================

#[tokio::test]
async fn test_scope_expansion_uses_scope_lookup() {
    let fx = Fixture::new();
    fx.resource(Resource::new("ra", "Ra", RS).with_scope(Scope::new("s1", "view")));
    fx.resource(Resource::new("rb", "Rb", RS).with_scope(Scope::new("s2", "edit")));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("sp", "SP", PolicyCategory::Scope, RS)
            .with_associated("role-a")
            .with_scope("s1"),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::ScopeExpansion)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["ra"]);
}

#[tokio::test]
async fn test_scope_policy_without_scopes_contributes_nothing() {
    let fx = Fixture::new();
    fx.resource(Resource::new("ra", "Ra", RS).with_scope(Scope::new("s1", "view")));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(Policy::new("sp", "SP", PolicyCategory::Scope, RS).with_associated("role-a"))
        .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::ScopeExpansion)
        .await
        .unwrap();
    assert!(collected.is_empty());
}

#[tokio::test]
async fn test_collect_all_unions_direct_then_scope() {
    let fx = Fixture::new();
    let direct = fx.resource(Resource::new("d", "D", RS));
    fx.resource(Resource::new("s", "S", RS).with_scope(Scope::new("s1", "view")));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("sp", "SP", PolicyCategory::Scope, RS)
            .with_associated("role-a")
            .with_scope("s1"),
    )
    .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(direct),
    )
    .await;

    let collected = fx
        .collector()
        .collect_all(
            &server(),
            &roles(&["A"]),
            &[Strategy::Direct, Strategy::ScopeExpansion],
        )
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["d", "s"]);
}

// ============================================================================
// Name-scoped
// ============================================================================

#[tokio::test]
async fn test_name_scoped_keeps_anchor_and_children() {
    let fx = Fixture::new();
    let menu = fx.resource(Resource::new("menu", "main-menu", RS));
    let item = fx.resource(Resource::new("item", "item", RS).with_parent("menu"));
    let deep = fx.resource(Resource::new("deep", "deep", RS).with_parent("item"));
    let other = fx.resource(Resource::new("other", "other", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(other)
            .with_resource(deep)
            .with_resource(item)
            .with_resource(menu),
    )
    .await;

    let collected = fx
        .collector()
        .collect(
            &server(),
            &roles(&["A"]),
            &Strategy::NameScoped("main-menu".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["item", "menu"]);
}

#[tokio::test]
async fn test_name_scoped_unknown_name_is_empty_not_error() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(
            &server(),
            &roles(&["A"]),
            &Strategy::NameScoped("missing".to_string()),
        )
        .await
        .unwrap();
    assert!(collected.is_empty());
}

// ============================================================================
// Permission-scoped
// ============================================================================

#[tokio::test]
async fn test_permission_scoped_checks_id_or_parent() {
    let fx = Fixture::new();
    let tagged = fx.resource(Resource::new("tagged", "tagged", RS).with_permission("orders"));
    let child = fx.resource(Resource::new("child", "child", RS).with_parent("tagged"));
    let untagged = fx.resource(Resource::new("untagged", "untagged", RS));
    let stray = fx.resource(Resource::new("stray", "stray", RS).with_parent("untagged"));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(untagged)
            .with_resource(child)
            .with_resource(stray)
            .with_resource(tagged),
    )
    .await;

    let collected = fx
        .collector()
        .collect(
            &server(),
            &roles(&["A"]),
            &Strategy::PermissionScoped("orders".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["child", "tagged"]);
}

#[tokio::test]
async fn test_permission_scoped_unknown_permission_is_empty() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(
            &server(),
            &roles(&["A"]),
            &Strategy::PermissionScoped("nothing".to_string()),
        )
        .await
        .unwrap();
    assert!(collected.is_empty());
}

// ============================================================================
// Malformed configuration
// ============================================================================

#[tokio::test]
async fn test_malformed_configuration_aborts_whole_call() {
    let fx = Fixture::new();
    let good = fx.resource(Resource::new("good", "good", RS));
    let bad = fx.resource(Resource::new("bad", "bad", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("broken", "broken", PolicyCategory::Role, RS)
            .with_config("roles", r#"{"id":"A"}"#),
    )
    .await;
    fx.policy(
        Policy::new("p-good", "Good", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(good),
    )
    .await;
    fx.policy(
        Policy::new("p-bad", "Bad Permission", PolicyCategory::Resource, RS)
            .with_associated("broken")
            .with_resource(bad),
    )
    .await;

    let err = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap_err();

    match err {
        AuthzError::ConfigMalformed { policy, .. } => assert_eq!(policy, "Bad Permission"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_configuration_surfaces_even_after_match() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(Policy::new("broken", "broken", PolicyCategory::Role, RS).with_config("roles", "oops"))
        .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_associated("broken")
            .with_resource(rx),
    )
    .await;

    let result = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await;
    assert!(matches!(result, Err(AuthzError::ConfigMalformed { .. })));
}

// ============================================================================
// Association graph
// ============================================================================

#[tokio::test]
async fn test_aggregate_policies_are_descended() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(Policy::new("agg", "agg", PolicyCategory::Aggregate, RS).with_associated("role-a"))
        .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("agg")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["rx"]);
}

#[tokio::test]
async fn test_association_cycle_terminates() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("agg-1", "agg-1", PolicyCategory::Aggregate, RS)
            .with_associated("agg-2")
            .with_associated("p"),
    )
    .await;
    fx.policy(
        Policy::new("agg-2", "agg-2", PolicyCategory::Aggregate, RS)
            .with_associated("agg-1")
            .with_associated("role-a"),
    )
    .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("agg-1")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["rx"]);
}

#[tokio::test]
async fn test_unknown_associated_policy_is_skipped() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.role_policy("role-a", &["A"]).await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("ghost")
            .with_associated("role-a")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["rx"]);
}

#[tokio::test]
async fn test_unknown_server_is_empty() {
    let fx = Fixture::new();
    fx.role_policy("role-a", &["A"]).await;

    let collected = fx
        .collector()
        .collect(&ResourceServer::new("elsewhere"), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert!(collected.is_empty());
}

#[tokio::test]
async fn test_custom_roles_config_key() {
    let fx = Fixture::new();
    let rx = fx.resource(Resource::new("rx", "Rx", RS));
    fx.policy(
        Policy::new("role-a", "role-a", PolicyCategory::Role, RS)
            .with_config("clientRoles", r#"[{"id":"A"}]"#),
    )
    .await;
    fx.policy(
        Policy::new("p", "P", PolicyCategory::Resource, RS)
            .with_associated("role-a")
            .with_resource(rx),
    )
    .await;

    let collected = fx
        .collector()
        .with_roles_config_key("clientRoles")
        .collect(&server(), &roles(&["A"]), &Strategy::Direct)
        .await
        .unwrap();
    assert_eq!(ids(&collected), vec!["rx"]);
}
