//! Concrete holder snapshots built from a graph declaration.
//!
//! `Role` and `User` carry actions; `Plan` and `Customer` carry features.
//! Parents are shared `Arc`s owned by the `Directory` that built them.

use std::sync::Arc;

use tracing::warn;

use lineage_contracts::{error::LineageResult, grant::Grant, query::ConstraintQuery};
use lineage_core::{query, Capabilities, CapabilityHolder, GrantCache};

/// A named group of actions, possibly inheriting from other roles.
#[derive(Debug)]
pub struct Role {
    pub(crate) name: String,
    pub(crate) actions: Vec<Grant>,
    pub(crate) roles: Vec<Arc<Role>>,
    pub(crate) cache: GrantCache,
}

/// An end user: direct actions, member roles, and an optional superuser flag.
#[derive(Debug)]
pub struct User {
    pub(crate) name: String,
    pub(crate) actions: Vec<Grant>,
    pub(crate) roles: Vec<Arc<Role>>,
    pub(crate) superuser: bool,
    pub(crate) cache: GrantCache,
}

/// A subscription plan, possibly inheriting features from other plans.
#[derive(Debug)]
pub struct Plan {
    pub(crate) name: String,
    pub(crate) features: Vec<Grant>,
    pub(crate) plans: Vec<Arc<Plan>>,
    pub(crate) cache: GrantCache,
}

/// A customer: direct features plus the plans it subscribes to.
#[derive(Debug)]
pub struct Customer {
    pub(crate) name: String,
    pub(crate) features: Vec<Grant>,
    pub(crate) plans: Vec<Arc<Plan>>,
    pub(crate) cache: GrantCache,
}

impl Role {
    pub fn roles(&self) -> &[Arc<Role>] {
        &self.roles
    }
}

impl User {
    pub fn roles(&self) -> &[Arc<Role>] {
        &self.roles
    }
}

impl Plan {
    pub fn plans(&self) -> &[Arc<Plan>] {
        &self.plans
    }
}

impl Customer {
    pub fn plans(&self) -> &[Arc<Plan>] {
        &self.plans
    }
}

fn lend<T: CapabilityHolder>(parents: &[Arc<T>]) -> Vec<&dyn CapabilityHolder> {
    parents.iter().map(|p| &**p as &dyn CapabilityHolder).collect()
}

impl CapabilityHolder for Role {
    fn name(&self) -> &str {
        &self.name
    }

    fn direct_grants(&self) -> &[Grant] {
        &self.actions
    }

    fn parents(&self) -> Vec<&dyn CapabilityHolder> {
        lend(&self.roles)
    }

    fn grant_cache(&self) -> &GrantCache {
        &self.cache
    }
}

impl CapabilityHolder for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn direct_grants(&self) -> &[Grant] {
        &self.actions
    }

    fn parents(&self) -> Vec<&dyn CapabilityHolder> {
        lend(&self.roles)
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn grant_cache(&self) -> &GrantCache {
        &self.cache
    }
}

impl CapabilityHolder for Plan {
    fn name(&self) -> &str {
        &self.name
    }

    fn direct_grants(&self) -> &[Grant] {
        &self.features
    }

    fn parents(&self) -> Vec<&dyn CapabilityHolder> {
        lend(&self.plans)
    }

    fn grant_cache(&self) -> &GrantCache {
        &self.cache
    }
}

impl CapabilityHolder for Customer {
    fn name(&self) -> &str {
        &self.name
    }

    fn direct_grants(&self) -> &[Grant] {
        &self.features
    }

    fn parents(&self) -> Vec<&dyn CapabilityHolder> {
        lend(&self.plans)
    }

    fn grant_cache(&self) -> &GrantCache {
        &self.cache
    }
}

/// Action queries in the user/role vocabulary.
pub trait ActionHolder: CapabilityHolder + Sized {
    fn can_perform<'q>(
        &self,
        action: &str,
        constraint: impl Into<ConstraintQuery<'q>>,
    ) -> LineageResult<bool> {
        query::can_perform(self, action, constraint)
    }

    /// Is `role` one of this holder's direct roles?
    fn assigned_to(&self, role: &str) -> bool {
        query::assigned_to(self, role)
    }

    /// Does this holder inherit from `role` through any chain of roles?
    fn inherits_from(&self, role: &str) -> LineageResult<bool> {
        query::inherits_from(self, role)
    }

    fn actions(&self) -> LineageResult<Capabilities<'_>> {
        query::list_capabilities(self)
    }

    #[deprecated(note = "use `assigned_to`")]
    fn belongs_to(&self, role: &str) -> bool {
        warn!(holder = %self.name(), "`belongs_to` is deprecated; use `assigned_to`");
        self.assigned_to(role)
    }

    #[deprecated(note = "use `inherits_from`")]
    fn takes_from(&self, role: &str) -> LineageResult<bool> {
        warn!(holder = %self.name(), "`takes_from` is deprecated; use `inherits_from`");
        self.inherits_from(role)
    }
}

impl ActionHolder for Role {}

impl ActionHolder for User {}

/// Feature queries in the customer/plan vocabulary.
pub trait FeatureHolder: CapabilityHolder + Sized {
    fn has_feature<'q>(
        &self,
        feature: &str,
        constraint: impl Into<ConstraintQuery<'q>>,
    ) -> LineageResult<bool> {
        query::has_feature(self, feature, constraint)
    }

    /// Is `plan` one of this holder's direct plans?
    fn in_plan(&self, plan: &str) -> bool {
        query::assigned_to(self, plan)
    }

    /// Does this holder inherit from `plan` through any chain of plans?
    fn inherits_plan(&self, plan: &str) -> LineageResult<bool> {
        query::inherits_from(self, plan)
    }

    fn features(&self) -> LineageResult<Capabilities<'_>> {
        query::list_capabilities(self)
    }
}

impl FeatureHolder for Plan {}

impl FeatureHolder for Customer {}
