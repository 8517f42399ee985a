//! Point queries against a holder's effective grants.
//!
//! `can_perform` and `has_feature` share one contract; they differ only in
//! the name they log under, so hosts can keep "actions" (users and roles)
//! apart from "features" (customers and plans) in their diagnostics.
//!
//! Boolean checks deny on doubt: a malformed grant anywhere in the ancestry
//! is logged and answered with `false`. A cyclic parent graph is a structural
//! fault in the host's data and is returned as an error.

use std::collections::HashSet;

use tracing::{debug, warn};

use lineage_contracts::{
    error::LineageResult,
    grant::Constraints,
    query::ConstraintQuery,
};

use crate::resolver::{identity, resolve, Capabilities, InFlight};
use crate::traits::CapabilityHolder;

/// Can `holder` perform `action` under `constraint`?
///
/// - A superuser always can, without resolution.
/// - `RequireUnconstrained` (the default) needs a blanket grant.
/// - `AnyConstraint` accepts any grant of `action`.
/// - A token needs a blanket grant or a constrained grant listing the token.
///
/// # Errors
///
/// Only `CyclicInheritance`. Malformed grants answer `Ok(false)`.
pub fn can_perform<'q>(
    holder: &dyn CapabilityHolder,
    action: &str,
    constraint: impl Into<ConstraintQuery<'q>>,
) -> LineageResult<bool> {
    check(holder, "action", action, constraint.into())
}

/// Does `holder` have `feature` under `constraint`?
///
/// Same contract as [`can_perform`], for the customer/plan domain.
pub fn has_feature<'q>(
    holder: &dyn CapabilityHolder,
    feature: &str,
    constraint: impl Into<ConstraintQuery<'q>>,
) -> LineageResult<bool> {
    check(holder, "feature", feature, constraint.into())
}

fn check(
    holder: &dyn CapabilityHolder,
    kind: &'static str,
    name: &str,
    query: ConstraintQuery<'_>,
) -> LineageResult<bool> {
    if holder.is_superuser() {
        debug!(holder = %holder.name(), kind, capability = %name, "superuser bypass");
        return Ok(true);
    }

    let map = match resolve(holder) {
        Ok(map) => map,
        Err(err) if err.is_recoverable() => {
            warn!(
                holder = %holder.name(),
                kind,
                capability = %name,
                error = %err,
                "grant resolution failed; denying"
            );
            return Ok(false);
        }
        Err(err) => return Err(err),
    };

    let granted = map
        .get(name)
        .is_some_and(|constraints| constraints.satisfies(query));

    debug!(
        holder = %holder.name(),
        kind,
        capability = %name,
        query = ?query,
        granted,
        "capability check"
    );
    Ok(granted)
}

/// Is `parent_name` one of `holder`'s direct parents?
///
/// Not recursive, and a superuser flag has no effect.
pub fn assigned_to(holder: &dyn CapabilityHolder, parent_name: &str) -> bool {
    holder.parents().iter().any(|parent| parent.name() == parent_name)
}

/// Does `holder` inherit from `ancestor_name`, directly or through any chain
/// of parents?
///
/// # Errors
///
/// `CyclicInheritance` if the walk re-enters a holder before finding the
/// ancestor.
pub fn inherits_from(holder: &dyn CapabilityHolder, ancestor_name: &str) -> LineageResult<bool> {
    AncestorSearch::new(ancestor_name).visit(holder)
}

/// Depth-first search for a named ancestor.
///
/// A holder whose ancestry has been fully searched without a match goes into
/// `exhausted` and is never walked again in the same query, so shared
/// ancestors cost one visit each.
struct AncestorSearch<'n> {
    ancestor_name: &'n str,
    in_flight: InFlight,
    exhausted: HashSet<usize>,
}

impl<'n> AncestorSearch<'n> {
    fn new(ancestor_name: &'n str) -> Self {
        Self {
            ancestor_name,
            in_flight: InFlight::default(),
            exhausted: HashSet::new(),
        }
    }

    fn visit(&mut self, holder: &dyn CapabilityHolder) -> LineageResult<bool> {
        if self.exhausted.contains(&identity(holder)) {
            return Ok(false);
        }

        let parents = holder.parents();
        if parents.iter().any(|parent| parent.name() == self.ancestor_name) {
            return Ok(true);
        }

        self.in_flight.enter(holder)?;
        let mut outcome = Ok(false);
        for parent in parents {
            match self.visit(parent) {
                Ok(false) => continue,
                found_or_failed => {
                    outcome = found_or_failed;
                    break;
                }
            }
        }
        self.in_flight.leave();

        if matches!(outcome, Ok(false)) {
            self.exhausted.insert(identity(holder));
        }
        outcome
    }
}

/// Every capability name `holder` resolves to, in ascending order.
///
/// The iterator borrows the holder's cached map; clone it to enumerate again.
/// The superuser flag does not change the listing.
pub fn list_capabilities(holder: &dyn CapabilityHolder) -> LineageResult<Capabilities<'_>> {
    Ok(resolve(holder)?.names())
}

/// The merged constraints `holder` ends up with for `name`, if any.
pub fn constraints_for<'h>(
    holder: &'h dyn CapabilityHolder,
    name: &str,
) -> LineageResult<Option<&'h Constraints>> {
    Ok(resolve(holder)?.get(name))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
