//! # lineage-policy
//!
//! A reference host for lineage: graph snapshots declared in TOML or JSON.
//!
//! ## Overview
//!
//! [`Directory`] parses a [`GraphConfig`] and builds shared [`Role`],
//! [`User`], [`Plan`], and [`Customer`] values that implement
//! [`CapabilityHolder`](lineage_core::CapabilityHolder). [`ActionHolder`] and
//! [`FeatureHolder`] add the query API in each domain's vocabulary.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use lineage_policy::{ActionHolder, Directory};
//!
//! let directory = Directory::from_toml_str(include_str!("forum.toml"))?;
//! let alice = directory.user("alice").unwrap();
//! assert!(alice.can_perform("ban_user", "forum_x")?);
//! ```

pub mod config;
pub mod directory;
pub mod holders;

pub use config::{GraphConfig, HolderEntry};
pub use directory::Directory;
pub use holders::{ActionHolder, Customer, FeatureHolder, Plan, Role, User};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use lineage_contracts::query::ConstraintQuery::RequireUnconstrained;
    use lineage_core::CapabilityHolder;

    use crate::{ActionHolder, Directory};

    const GRAPH: &str = r#"
        [[roles]]
        name = "readers"
        actions = ["read"]

        [[roles]]
        name = "editors"
        actions = [{ name = "edit", constraints = ["drafts"] }]
        roles = ["readers"]

        [[users]]
        name = "carol"
        roles = ["editors"]
    "#;

    // ── Deprecated aliases ────────────────────────────────────────────────────

    /// The historical spellings answer exactly like the methods they wrap.
    #[test]
    #[allow(deprecated)]
    fn deprecated_aliases_delegate() {
        let directory = Directory::from_toml_str(GRAPH).unwrap();
        let carol = directory.user("carol").unwrap();

        for role in ["editors", "readers", "admins"] {
            assert_eq!(carol.belongs_to(role), carol.assigned_to(role));
            assert_eq!(carol.takes_from(role).unwrap(), carol.inherits_from(role).unwrap());
        }
        assert!(!carol.belongs_to("readers"));
        assert!(carol.takes_from("readers").unwrap());
    }

    // ── Role-level queries ────────────────────────────────────────────────────

    #[test]
    fn roles_answer_queries_too() {
        let directory = Directory::from_toml_str(GRAPH).unwrap();
        let editors = directory.role("editors").unwrap();

        assert!(editors.can_perform("read", RequireUnconstrained).unwrap());
        assert!(editors.can_perform("edit", "drafts").unwrap());
        assert!(!editors.can_perform("edit", RequireUnconstrained).unwrap());
        assert!(editors.assigned_to("readers"));
    }

    #[test]
    fn separate_snapshots_do_not_share_caches() {
        let first = Directory::from_toml_str(GRAPH).unwrap();
        let second = Directory::from_toml_str(GRAPH).unwrap();
        let carol = first.user("carol").unwrap();

        assert!(carol.can_perform("read", RequireUnconstrained).unwrap());
        assert!(carol.grant_cache().is_resolved());
        assert!(!second.user("carol").unwrap().grant_cache().is_resolved());
    }
}
