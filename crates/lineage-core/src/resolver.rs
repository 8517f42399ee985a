//! Effective grant resolution.
//!
//! Resolution algorithm for a holder `h`:
//!
//! 1. If `h` already carries a resolved map, return it.
//! 2. Mark `h` as in flight. Entering a holder that is already in flight on
//!    the current call stack means the parent graph loops: fail with
//!    `CyclicInheritance` instead of recursing forever.
//! 3. Seed the map from `h.direct_grants()`.
//! 4. Resolve every parent (recursively, same in-flight set) and merge each
//!    of its entries into the map with `Constraints::merge`.
//! 5. Publish the map into `h.grant_cache()` and return it.
//!
//! No lock is held while recursing. Threads racing on the same holder may
//! each compute a map; the first one published wins and the others are
//! dropped. Resolution is pure, so every racer computes the same map.

use std::collections::{btree_map, BTreeMap, HashSet};
use std::iter::FusedIterator;
use std::sync::OnceLock;

use tracing::{debug, trace, warn};

use lineage_contracts::{
    error::{LineageError, LineageResult},
    grant::Constraints,
};

use crate::traits::CapabilityHolder;

/// Capability name → merged constraints, covering a holder's own grants and
/// everything it inherits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveGrantMap {
    entries: BTreeMap<String, Constraints>,
}

impl EffectiveGrantMap {
    pub fn get(&self, name: &str) -> Option<&Constraints> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolved capability names in ascending order.
    pub fn names(&self) -> Capabilities<'_> {
        Capabilities { keys: self.entries.keys() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constraints)> {
        self.entries.iter().map(|(name, constraints)| (name.as_str(), constraints))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge_entry(&mut self, name: &str, constraints: &Constraints) {
        match self.entries.get_mut(name) {
            Some(existing) => *existing = existing.merge(constraints),
            None => {
                self.entries.insert(name.to_string(), constraints.clone());
            }
        }
    }
}

/// Lazy, finite, restartable enumeration of resolved capability names.
///
/// Clone the iterator to walk the names again.
#[derive(Debug, Clone)]
pub struct Capabilities<'a> {
    keys: btree_map::Keys<'a, String, Constraints>,
}

impl<'a> Iterator for Capabilities<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next().map(String::as_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for Capabilities<'_> {}

impl FusedIterator for Capabilities<'_> {}

/// Holder-local memo for the resolved grant map.
///
/// Written at most once; readers after publication never block.
#[derive(Debug, Default)]
pub struct GrantCache {
    resolved: OnceLock<EffectiveGrantMap>,
}

impl GrantCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published map, if resolution has completed for this holder.
    pub fn get(&self) -> Option<&EffectiveGrantMap> {
        self.resolved.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Publish `map` unless another caller got there first; return whichever won.
    fn publish(&self, map: EffectiveGrantMap) -> &EffectiveGrantMap {
        let mut candidate = Some(map);
        let published = self.resolved.get_or_init(|| candidate.take().unwrap_or_default());
        if candidate.is_some() {
            trace!("discarding concurrently computed grant map");
        }
        published
    }
}

/// Holders currently being walked on this call stack.
///
/// Identity is the holder's address: two distinct snapshots that share a
/// name are different holders.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    seen: HashSet<usize>,
    stack: Vec<(usize, String)>,
}

impl InFlight {
    pub(crate) fn enter(&mut self, holder: &dyn CapabilityHolder) -> LineageResult<()> {
        let id = identity(holder);
        if !self.seen.insert(id) {
            let start = self.stack.iter().position(|(seen, _)| *seen == id).unwrap_or(0);
            let mut chain: Vec<String> =
                self.stack[start..].iter().map(|(_, name)| name.clone()).collect();
            chain.push(holder.name().to_string());

            warn!(
                holder = %holder.name(),
                chain = %chain.join(" -> "),
                "cyclic inheritance detected"
            );
            return Err(LineageError::CyclicInheritance {
                holder: holder.name().to_string(),
                chain,
            });
        }
        self.stack.push((id, holder.name().to_string()));
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        if let Some((id, _)) = self.stack.pop() {
            self.seen.remove(&id);
        }
    }
}

pub(crate) fn identity(holder: &dyn CapabilityHolder) -> usize {
    std::ptr::from_ref(holder).cast::<()>() as usize
}

/// Compute (or fetch the memoized) effective grant map of `holder`.
///
/// # Errors
///
/// - `MalformedGrant` if the holder or any ancestor lists a capability twice
///   among its direct grants.
/// - `CyclicInheritance` if the parent graph reachable from `holder` loops.
pub fn resolve(holder: &dyn CapabilityHolder) -> LineageResult<&EffectiveGrantMap> {
    resolve_within(holder, &mut InFlight::default())
}

fn resolve_within<'h>(
    holder: &'h dyn CapabilityHolder,
    in_flight: &mut InFlight,
) -> LineageResult<&'h EffectiveGrantMap> {
    if let Some(map) = holder.grant_cache().get() {
        trace!(holder = %holder.name(), "grant map cache hit");
        return Ok(map);
    }

    in_flight.enter(holder)?;
    let computed = compute(holder, in_flight);
    in_flight.leave();
    let map = computed?;

    debug!(
        holder = %holder.name(),
        capabilities = map.len(),
        "resolved effective grants"
    );
    Ok(holder.grant_cache().publish(map))
}

fn compute(
    holder: &dyn CapabilityHolder,
    in_flight: &mut InFlight,
) -> LineageResult<EffectiveGrantMap> {
    let mut map = EffectiveGrantMap::default();

    for grant in holder.direct_grants() {
        if map.contains(grant.name()) {
            return Err(LineageError::malformed(format!(
                "holder '{}' grants '{}' more than once",
                holder.name(),
                grant.name()
            )));
        }
        map.merge_entry(grant.name(), grant.constraints());
    }

    for parent in holder.parents() {
        let inherited = resolve_within(parent, in_flight)?;
        for (name, constraints) in inherited.iter() {
            map.merge_entry(name, constraints);
        }
    }

    Ok(map)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
