//! # lineage-contracts
//!
//! Shared types for the lineage capability resolver.
//!
//! All crates in the workspace import from here. Nothing in this crate walks
//! a holder graph: it defines grants, the rule for merging two grants of the
//! same capability, the query argument, and the error type.

pub mod error;
pub mod grant;
pub mod query;

pub use error::{LineageError, LineageResult};
pub use grant::{ConstraintSet, Constraints, Grant, RawGrant};
pub use query::ConstraintQuery;

#[cfg(test)]
mod tests {
    use super::*;

    // ── ConstraintQuery ──────────────────────────────────────────────────────

    #[test]
    fn missing_constraint_means_require_unconstrained() {
        assert_eq!(ConstraintQuery::default(), ConstraintQuery::RequireUnconstrained);
        assert_eq!(ConstraintQuery::from(None::<&str>), ConstraintQuery::RequireUnconstrained);
        assert_eq!(ConstraintQuery::from(Some("forum_x")), ConstraintQuery::Token("forum_x"));
        assert_eq!(ConstraintQuery::from("forum_x"), ConstraintQuery::Token("forum_x"));
    }

    // ── LineageError display messages ────────────────────────────────────────

    #[test]
    fn error_malformed_grant_display() {
        let err = LineageError::malformed("constraint set must not be empty");
        let msg = err.to_string();
        assert!(msg.contains("malformed grant"));
        assert!(msg.contains("constraint set must not be empty"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn error_cyclic_inheritance_display() {
        let err = LineageError::CyclicInheritance {
            holder: "mods".to_string(),
            chain: vec!["mods".to_string(), "admins".to_string(), "mods".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("cyclic inheritance at 'mods'"));
        assert!(msg.contains("mods -> admins -> mods"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn error_config_error_display() {
        let err = LineageError::ConfigError {
            reason: "unknown parent role 'ghosts'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("ghosts"));
    }
}
