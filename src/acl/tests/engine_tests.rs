//! Decision engine tests
//!
//! Exercises the full path: user roles → catalog lookup → store rules →
//! scoped check / filter fold.

use cretoai_acl::{
    AclConfig, AclEngine, EvalContext, FilterDecision, FilterResult, InMemoryPermissionStore,
    PermissionDescriptor, PermissionRule, PermissionStore, Predicate, PredicateSet, RoleId,
};
use std::sync::Arc;

const CONFIG: &str = r#"
default_permission = false
always_allow = ["login"]

[[resources]]
id = 1
name = "documents"
routes = ["documents.index", "documents.show"]

[[resources]]
id = 2
name = "reports"

[[resources]]
id = 3
name = "settings"
"#;

const ALICE: u64 = 100;
const BOB: u64 = 200;
const NOBODY: u64 = 300;

struct Fixture {
    engine: AclEngine,
    store: Arc<InMemoryPermissionStore>,
}

impl Fixture {
    async fn new(config: &str) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let config = AclConfig::from_toml_str(config).unwrap();
        let store = Arc::new(InMemoryPermissionStore::new());
        let engine = AclEngine::new(&config, store.clone()).unwrap();
        Self { engine, store }
    }

    async fn role(&self, name: &str, admin: bool, users: &[u64]) -> RoleId {
        let role = self.store.create_role(name, admin).await.unwrap();
        self.store.set_role_users(role.id, users).await.unwrap();
        role.id
    }

    async fn rules(&self, role: RoleId, rules: Vec<PermissionRule>) {
        self.store.replace_role_rules(role, rules).await.unwrap();
    }

    async fn check(&self, resource: &str, values: &[&str], user: u64) -> bool {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.engine
            .check(EvalContext::guarded(), resource, &values, Some(user))
            .await
            .unwrap()
    }

    async fn filter(&self, resource: &str, user: u64) -> FilterDecision {
        self.engine
            .check_for_where(EvalContext::guarded(), resource, Some(user))
            .await
            .unwrap()
    }
}

// ============================================================================
// FAST PATHS
// ============================================================================

#[tokio::test]
async fn test_no_user_is_denied() {
    let fx = Fixture::new(CONFIG).await;
    let ctx = EvalContext::guarded();

    assert!(!fx.engine.check(ctx, "documents", &[], None).await.unwrap());
    assert_eq!(
        fx.engine.check_for_where(ctx, "documents", None).await.unwrap(),
        FilterDecision::disallowed()
    );
}

#[tokio::test]
async fn test_unguarded_context_allows_everything() {
    let fx = Fixture::new(CONFIG).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(role, vec![PermissionRule::deny_all(role, 1)]).await;

    let ctx = EvalContext::unguarded();
    assert!(fx.engine.check(ctx, "documents", &["1".into()], Some(ALICE)).await.unwrap());
    assert!(fx.engine.check(ctx, "documents", &[], None).await.unwrap());
    assert_eq!(
        fx.engine.check_for_where(ctx, "documents", Some(ALICE)).await.unwrap(),
        FilterDecision::allowed()
    );

    // The guarded context is unaffected
    assert!(!fx.check("documents", &["1"], ALICE).await);
}

#[tokio::test]
async fn test_always_allow_resource() {
    let fx = Fixture::new(CONFIG).await;

    assert!(fx.check("login", &[], NOBODY).await);
    assert!(fx.engine.check(EvalContext::guarded(), "login", &[], None).await.unwrap());
    assert_eq!(fx.filter("login", NOBODY).await, FilterDecision::allowed());
    assert_eq!(
        fx.engine.check_for_where(EvalContext::guarded(), "login", None).await.unwrap(),
        FilterDecision::allowed()
    );
}

#[tokio::test]
async fn test_admin_role_allows_everything() {
    let fx = Fixture::new(CONFIG).await;
    let viewers = fx.role("viewers", false, &[ALICE]).await;
    fx.role("admins", true, &[ALICE]).await;
    fx.rules(viewers, vec![PermissionRule::deny_all(viewers, 1)]).await;

    assert!(fx.check("documents", &["5"], ALICE).await);
    assert!(fx.check("unmapped", &[], ALICE).await);
    assert_eq!(fx.filter("documents", ALICE).await, FilterDecision::allowed());
    assert!(fx.engine.is_admin(EvalContext::guarded(), Some(ALICE)).await.unwrap());
    assert!(!fx.engine.is_admin(EvalContext::guarded(), Some(BOB)).await.unwrap());
}

// ============================================================================
// DEFAULT PERMISSION
// ============================================================================

#[tokio::test]
async fn test_zero_rules_use_default_permission() {
    for (config, expected) in [
        (CONFIG.replace("default_permission = false", "default_permission = true"), true),
        (CONFIG.to_string(), false),
    ] {
        let fx = Fixture::new(&config).await;
        let role = fx.role("viewers", false, &[ALICE]).await;
        fx.rules(role, vec![PermissionRule::allow_all(role, 2)]).await;

        // No rules for this resource
        assert_eq!(fx.check("settings", &["1"], ALICE).await, expected);
        assert_eq!(fx.check("settings", &[], ALICE).await, expected);
        assert_eq!(fx.filter("settings", ALICE).await, FilterDecision::default_for(expected));

        // Unmapped resource
        assert_eq!(fx.check("unknown", &[], ALICE).await, expected);
        assert_eq!(fx.filter("unknown", ALICE).await, FilterDecision::default_for(expected));

        // User without roles
        assert_eq!(fx.check("documents", &["1"], NOBODY).await, expected);
        assert_eq!(fx.filter("documents", NOBODY).await, FilterDecision::default_for(expected));
    }
}

// ============================================================================
// SCOPED CHECK
// ============================================================================

#[tokio::test]
async fn test_route_names_resolve_to_their_resource() {
    let fx = Fixture::new(CONFIG).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(role, vec![PermissionRule::allow(role, 1, "42")]).await;

    assert!(fx.check("documents.show", &["42"], ALICE).await);
    assert!(!fx.check("documents.show", &["43"], ALICE).await);
    assert_eq!(fx.filter("documents.index", ALICE).await, FilterDecision::only(["42"]));
}

#[tokio::test]
async fn test_unscoped_check_short_circuits_on_allow() {
    let fx = Fixture::new(CONFIG).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(role, vec![PermissionRule::allow(role, 2, "17")]).await;

    assert!(fx.check("reports", &[], ALICE).await);
}

#[tokio::test]
async fn test_wildcard_allow_grants_any_value() {
    let fx = Fixture::new(CONFIG).await;
    let a = fx.role("a", false, &[ALICE]).await;
    let b = fx.role("b", false, &[ALICE]).await;
    fx.rules(a, vec![PermissionRule::deny_all(a, 1), PermissionRule::deny(a, 1, "9")]).await;
    fx.rules(b, vec![PermissionRule::allow_all(b, 1)]).await;

    for id in ["1", "9", "1000"] {
        assert!(fx.check("documents", &[id], ALICE).await, "value {id}");
    }
    assert_eq!(fx.filter("documents", ALICE).await, FilterDecision::allowed());
}

#[tokio::test]
async fn test_allow_list_without_hit_is_denied() {
    let fx = Fixture::new(&CONFIG.replace("default_permission = false", "default_permission = true")).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(
        role,
        vec![PermissionRule::allow(role, 1, "1"), PermissionRule::allow(role, 1, "2")],
    )
    .await;

    assert!(fx.check("documents", &["1"], ALICE).await);
    assert!(!fx.check("documents", &["3"], ALICE).await);
}

#[tokio::test]
async fn test_rules_only_apply_to_the_users_roles() {
    let fx = Fixture::new(CONFIG).await;
    let alice_role = fx.role("alice", false, &[ALICE]).await;
    let bob_role = fx.role("bob", false, &[BOB]).await;
    fx.rules(alice_role, vec![PermissionRule::allow(alice_role, 1, "1")]).await;
    fx.rules(bob_role, vec![PermissionRule::allow(bob_role, 1, "2")]).await;

    assert!(fx.check("documents", &["1"], ALICE).await);
    assert!(!fx.check("documents", &["2"], ALICE).await);
    assert!(fx.check("documents", &["2"], BOB).await);
}

// ============================================================================
// FILTER DECISIONS
// ============================================================================

#[tokio::test]
async fn test_filter_include_then_deny_keeps_include_list() {
    let fx = Fixture::new(CONFIG).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(
        role,
        vec![PermissionRule::allow(role, 1, "1"), PermissionRule::deny(role, 1, "2")],
    )
    .await;

    let decision = fx.filter("documents", ALICE).await;
    assert_eq!(decision.result, FilterResult::PartlyAllowed);
    assert!(decision.include);
    assert_eq!(decision, FilterDecision::only(["1"]));
}

#[tokio::test]
async fn test_filter_exclude_list_across_roles() {
    let fx = Fixture::new(CONFIG).await;
    let a = fx.role("a", false, &[ALICE]).await;
    let b = fx.role("b", false, &[ALICE]).await;
    fx.rules(a, vec![PermissionRule::deny(a, 2, "1"), PermissionRule::deny(a, 2, "2")]).await;
    fx.rules(b, vec![PermissionRule::allow(b, 2, "2")]).await;

    assert_eq!(fx.filter("reports", ALICE).await, FilterDecision::except(["1"]));
}

#[tokio::test]
async fn test_role_scoped_filter() {
    let fx = Fixture::new(CONFIG).await;
    let viewers = fx.role("viewers", false, &[]).await;
    let admins = fx.role("admins", true, &[]).await;
    fx.rules(viewers, vec![PermissionRule::deny(viewers, 2, "5")]).await;
    let ctx = EvalContext::guarded();

    assert_eq!(
        fx.engine.check_for_role_where(ctx, viewers, "reports").await.unwrap(),
        FilterDecision::except(["5"])
    );
    assert_eq!(
        fx.engine.check_for_role_where(ctx, admins, "reports").await.unwrap(),
        FilterDecision::allowed()
    );
    assert_eq!(
        fx.engine.check_for_role_where(ctx, viewers, "unmapped").await.unwrap(),
        FilterDecision::disallowed()
    );
    assert!(fx.engine.check_for_role_where(ctx, 999, "reports").await.is_err());
}

// ============================================================================
// QUERY INTEGRATION
// ============================================================================

#[tokio::test]
async fn test_add_where_restricts_query() {
    let fx = Fixture::new(CONFIG).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(
        role,
        vec![PermissionRule::allow(role, 1, "1"), PermissionRule::allow(role, 1, "4")],
    )
    .await;

    let mut query = PredicateSet::new();
    let may_run = fx
        .engine
        .add_where(EvalContext::guarded(), "documents", Some(ALICE), &mut query, "documents.id")
        .await
        .unwrap();

    assert!(may_run);
    assert_eq!(
        query.predicates(),
        &[Predicate::In {
            field: "documents.id".into(),
            values: ["1", "4"].into_iter().map(String::from).collect(),
        }]
    );
}

#[tokio::test]
async fn test_add_where_rejects_disallowed_query() {
    let fx = Fixture::new(&CONFIG.replace("default_permission = false", "default_permission = true")).await;
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(role, vec![PermissionRule::deny_all(role, 3)]).await;

    let mut query = PredicateSet::new();
    let may_run = fx
        .engine
        .add_where(EvalContext::guarded(), "settings", Some(ALICE), &mut query, "id")
        .await
        .unwrap();

    assert!(!may_run);
    assert!(query.is_empty());
}

#[tokio::test]
async fn test_add_where_for_role() {
    let fx = Fixture::new(CONFIG).await;
    let viewers = fx.role("viewers", false, &[]).await;
    fx.rules(viewers, vec![PermissionRule::deny(viewers, 2, "5")]).await;
    let ctx = EvalContext::guarded();

    let mut query = PredicateSet::new();
    let may_run = fx
        .engine
        .add_where_for_role(ctx, viewers, "reports", &mut query, "reports.id")
        .await
        .unwrap();
    assert!(may_run);
    assert_eq!(
        query.predicates(),
        &[Predicate::NotIn {
            field: "reports.id".into(),
            values: ["5"].into_iter().map(String::from).collect(),
        }]
    );

    // No rules for settings and a deny default
    let mut query = PredicateSet::new();
    let may_run = fx
        .engine
        .add_where_for_role(ctx, viewers, "settings", &mut query, "settings.id")
        .await
        .unwrap();
    assert!(!may_run);
    assert!(query.is_empty());
}

// ============================================================================
// EFFECTIVE PERMISSIONS
// ============================================================================

#[tokio::test]
async fn test_user_permissions_merge_roles() {
    let fx = Fixture::new(CONFIG).await;
    let a = fx.role("a", false, &[ALICE]).await;
    let b = fx.role("b", false, &[ALICE]).await;
    fx.rules(
        a,
        vec![PermissionRule::deny_all(a, 1), PermissionRule::allow(a, 2, "1")],
    )
    .await;
    fx.rules(
        b,
        vec![PermissionRule::allow(b, 1, "42"), PermissionRule::allow(b, 2, "2")],
    )
    .await;

    let permissions = fx
        .engine
        .user_permissions(EvalContext::guarded(), Some(ALICE))
        .await
        .unwrap();

    assert_eq!(
        permissions,
        vec![
            PermissionDescriptor::new("documents", ["42"], true),
            PermissionDescriptor::new("reports", ["1", "2"], true),
        ]
    );
}

#[tokio::test]
async fn test_admin_permissions_cover_catalog() {
    let fx = Fixture::new(CONFIG).await;
    fx.role("admins", true, &[ALICE]).await;

    let permissions = fx
        .engine
        .user_permissions(EvalContext::guarded(), Some(ALICE))
        .await
        .unwrap();
    assert_eq!(
        permissions,
        vec![
            PermissionDescriptor::allow_all("documents"),
            PermissionDescriptor::allow_all("reports"),
            PermissionDescriptor::allow_all("settings"),
        ]
    );

    let none = fx.engine.user_permissions(EvalContext::guarded(), None).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_concurrent_contexts_are_isolated() {
    let fx = Arc::new(Fixture::new(CONFIG).await);
    let role = fx.role("viewers", false, &[ALICE]).await;
    fx.rules(role, vec![PermissionRule::deny_all(role, 1)]).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let fx = fx.clone();
        handles.push(tokio::spawn(async move {
            let ctx = if i % 2 == 0 { EvalContext::guarded() } else { EvalContext::unguarded() };
            let allowed = fx
                .engine
                .check(ctx, "documents", &["1".to_string()], Some(ALICE))
                .await
                .unwrap();
            (ctx.guard, allowed)
        }));
    }

    for handle in handles {
        let (guard, allowed) = handle.await.unwrap();
        assert_eq!(allowed, !guard);
    }
}
