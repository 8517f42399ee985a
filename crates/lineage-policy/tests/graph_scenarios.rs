//! End-to-end checks over the bundled graph declarations.

use std::path::Path;
use std::sync::Arc;

use lineage_contracts::query::ConstraintQuery::{AnyConstraint, RequireUnconstrained};
use lineage_core::{constraints_for, CapabilityHolder};
use lineage_policy::{ActionHolder, Directory, FeatureHolder};

fn graph(file: &str) -> Directory {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("graphs").join(file);
    Directory::from_file(&path).unwrap()
}

#[test]
fn forum_moderators() {
    let directory = graph("forum.toml");
    let alice = directory.user("alice").unwrap();

    assert!(alice.can_perform("deploy", RequireUnconstrained).unwrap());
    assert!(alice.can_perform("ban_user", "forum_x").unwrap());
    assert!(!alice.can_perform("ban_user", "forum_y").unwrap());
    assert!(!alice.can_perform("ban_user", RequireUnconstrained).unwrap());
    assert!(alice.can_perform("ban_user", AnyConstraint).unwrap());
    assert!(!alice.assigned_to("devs"));
    assert!(alice.inherits_from("devs").unwrap());
}

#[test]
fn direct_and_inherited_constraints_union() {
    let directory = graph("forum.toml");
    let bob = directory.user("bob").unwrap();

    assert!(bob.can_perform("edit_post", "own").unwrap());
    assert!(bob.can_perform("edit_post", "pinned").unwrap());
    assert!(!bob.can_perform("edit_post", "others").unwrap());

    let entry = constraints_for(&**bob, "edit_post").unwrap().unwrap();
    assert_eq!(entry.to_string(), "constrained to {own, pinned}");
}

#[test]
fn root_is_superuser_without_roles() {
    let directory = graph("forum.toml");
    let root = directory.user("root").unwrap();

    assert!(root.can_perform("deploy", RequireUnconstrained).unwrap());
    assert!(!root.assigned_to("devs"));
    assert!(!root.inherits_from("devs").unwrap());
    assert_eq!(root.actions().unwrap().count(), 0);
}

#[test]
fn plan_tiers() {
    let directory = graph("plans.json");
    let acme = directory.customer("acme").unwrap();
    let globex = directory.customer("globex").unwrap();
    let initech = directory.customer("initech").unwrap();

    assert!(acme.has_feature("storage", "10gb").unwrap());
    assert!(acme.has_feature("storage", "1gb").unwrap());
    assert!(!acme.has_feature("storage", RequireUnconstrained).unwrap());
    assert!(!acme.has_feature("audit_log", AnyConstraint).unwrap());

    // Enterprise grants storage without limit, which dominates the tiers below.
    assert!(globex.has_feature("storage", RequireUnconstrained).unwrap());
    assert!(globex.has_feature("storage", "1pb").unwrap());
    assert!(globex.inherits_plan("basic").unwrap());
    assert!(!globex.in_plan("basic"));

    assert!(initech.has_feature("storage", "5gb").unwrap());
    assert!(!initech.has_feature("sso", RequireUnconstrained).unwrap());

    let features: Vec<&str> = globex.features().unwrap().collect();
    assert_eq!(features, vec!["audit_log", "backups", "sso", "storage"]);
}

#[test]
fn concurrent_queries_share_one_resolution() {
    let directory = graph("forum.toml");
    let alice = Arc::clone(directory.user("alice").unwrap());

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let alice = Arc::clone(&alice);
            scope.spawn(move || {
                assert!(alice.can_perform("ban_user", "forum_x").unwrap());
                assert!(alice.inherits_from("mods").unwrap());
            });
        }
    });

    assert!(alice.grant_cache().is_resolved());
    assert!(directory.role("mods").unwrap().grant_cache().is_resolved());
}
