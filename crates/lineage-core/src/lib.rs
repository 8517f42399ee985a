//! # lineage-core
//!
//! Hierarchical capability resolution for lineage.
//!
//! This crate provides:
//! - The `CapabilityHolder` trait hosts implement for users, roles, customers,
//!   and plans
//! - The resolver that merges a holder's direct grants with everything it
//!   inherits, memoized per holder and guarded against cyclic graphs
//! - The query API: `can_perform`, `has_feature`, `assigned_to`,
//!   `inherits_from`, `list_capabilities`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lineage_core::{can_perform, inherits_from};
//!
//! if can_perform(&user, "ban_user", "forum_x")? { /* ... */ }
//! ```

pub mod query;
pub mod resolver;
pub mod traits;

#[cfg(test)]
mod fixtures;

pub use query::{
    assigned_to, can_perform, constraints_for, has_feature, inherits_from, list_capabilities,
};
pub use resolver::{resolve, Capabilities, EffectiveGrantMap, GrantCache};
pub use traits::CapabilityHolder;
