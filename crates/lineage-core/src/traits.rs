//! The holder contract the host implements.
//!
//! Any entity that takes part in an inheritance graph (a user, a role, a
//! customer, a subscription plan) exposes its own grants, the holders it
//! inherits from, and a superuser flag. The resolver and the query API depend
//! on nothing else.

use lineage_contracts::grant::Grant;

use crate::resolver::GrantCache;

/// A node in a capability inheritance graph.
///
/// Implementations are snapshots: for as long as a holder value lives, its
/// grants and parents must not change. The engine never mutates a holder; the
/// only state it writes is the memoized map inside `grant_cache()`. To pick up
/// new data from storage, build a new holder.
pub trait CapabilityHolder: Send + Sync {
    /// Stable identifier compared by `assigned_to` and `inherits_from`.
    fn name(&self) -> &str;

    /// Grants assigned explicitly to this holder, not inherited.
    ///
    /// Each capability name may appear at most once.
    fn direct_grants(&self) -> &[Grant];

    /// Holders this one inherits from, in declaration order.
    ///
    /// Parents are shared and owned elsewhere; the holder only lends them out.
    fn parents(&self) -> Vec<&dyn CapabilityHolder>;

    /// A superuser passes every capability check without resolution.
    fn is_superuser(&self) -> bool {
        false
    }

    /// The holder-local cell that memoizes the resolved grant map.
    fn grant_cache(&self) -> &GrantCache;
}
