//! Building an immutable holder snapshot from a graph declaration.
//!
//! `Directory` reads a `GraphConfig` from TOML or JSON and turns it into
//! shared `Role`/`User`/`Plan`/`Customer` values. Build order:
//!
//! 1. Roles and plans are built parents-first, on demand, by name.
//!    A name that is already being built further up the stack means the
//!    declaration is cyclic → `CyclicInheritance`.
//! 2. Users and customers are built last and point at the shared roles/plans.
//!
//! Every grant is validated on the way in, so a snapshot that loads never
//! holds a malformed grant.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use lineage_contracts::{
    error::{LineageError, LineageResult},
    grant::Grant,
};
use lineage_core::GrantCache;

use crate::config::{GraphConfig, HolderEntry};
use crate::holders::{Customer, Plan, Role, User};

/// A loaded graph snapshot.
///
/// Construct via `from_toml_str`, `from_json_str`, or `from_file`, then look
/// holders up by name. To pick up changed data, load a new `Directory`; the
/// memoized grant maps belong to the old snapshot.
///
/// ```rust,ignore
/// use lineage_policy::{ActionHolder, Directory};
///
/// let directory = Directory::from_file(Path::new("graphs/forum.toml"))?;
/// let alice = directory.user("alice").expect("declared");
/// alice.can_perform("ban_user", "forum_x")?;
/// ```
#[derive(Debug, Default)]
pub struct Directory {
    roles: BTreeMap<String, Arc<Role>>,
    users: BTreeMap<String, Arc<User>>,
    plans: BTreeMap<String, Arc<Plan>>,
    customers: BTreeMap<String, Arc<Customer>>,
}

impl Directory {
    /// Parse `s` as a TOML graph declaration and build the snapshot.
    ///
    /// Returns `ConfigError` if the TOML is malformed or references unknown
    /// holders, `MalformedGrant` for a bad grant, and `CyclicInheritance` if
    /// the declared roles or plans loop.
    pub fn from_toml_str(s: &str) -> LineageResult<Self> {
        let config: GraphConfig = toml::from_str(s).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to parse graph TOML: {}", e),
        })?;
        Self::from_config(&config)
    }

    /// Same as `from_toml_str`, for a JSON document.
    pub fn from_json_str(s: &str) -> LineageResult<Self> {
        let config: GraphConfig = serde_json::from_str(s).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to parse graph JSON: {}", e),
        })?;
        Self::from_config(&config)
    }

    /// Read the file at `path`; a `.json` extension selects JSON, anything
    /// else is read as TOML.
    pub fn from_file(path: &Path) -> LineageResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LineageError::ConfigError {
            reason: format!("failed to read graph file '{}': {}", path.display(), e),
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    pub fn from_config(config: &GraphConfig) -> LineageResult<Self> {
        let roles =
            GroupBuilder::new("role", &config.roles)?.build_all(|entry, actions, roles| Role {
                name: entry.name.clone(),
                actions,
                roles,
                cache: GrantCache::new(),
            })?;
        let plans =
            GroupBuilder::new("plan", &config.plans)?.build_all(|entry, features, plans| Plan {
                name: entry.name.clone(),
                features,
                plans,
                cache: GrantCache::new(),
            })?;

        let users =
            build_members("user", "role", &config.users, &roles, |entry, actions, roles| User {
                name: entry.name.clone(),
                actions,
                roles,
                superuser: entry.superuser,
                cache: GrantCache::new(),
            })?;
        let customers =
            build_members("customer", "plan", &config.customers, &plans, |entry, features, plans| {
                Customer {
                    name: entry.name.clone(),
                    features,
                    plans,
                    cache: GrantCache::new(),
                }
            })?;

        info!(
            roles = roles.len(),
            users = users.len(),
            plans = plans.len(),
            customers = customers.len(),
            "graph snapshot loaded"
        );

        Ok(Self { roles, users, plans, customers })
    }

    pub fn role(&self, name: &str) -> Option<&Arc<Role>> {
        self.roles.get(name)
    }

    pub fn user(&self, name: &str) -> Option<&Arc<User>> {
        self.users.get(name)
    }

    pub fn plan(&self, name: &str) -> Option<&Arc<Plan>> {
        self.plans.get(name)
    }

    pub fn customer(&self, name: &str) -> Option<&Arc<Customer>> {
        self.customers.get(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Arc<Role>> {
        self.roles.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &Arc<User>> {
        self.users.values()
    }

    pub fn plans(&self) -> impl Iterator<Item = &Arc<Plan>> {
        self.plans.values()
    }

    pub fn customers(&self) -> impl Iterator<Item = &Arc<Customer>> {
        self.customers.values()
    }
}

/// Validate one entry's grants: each must convert, and no name may repeat.
fn convert_grants(kind: &str, entry: &HolderEntry) -> LineageResult<Vec<Grant>> {
    let mut seen = HashSet::new();
    let mut grants = Vec::with_capacity(entry.grants.len());
    for raw in &entry.grants {
        let grant = Grant::try_from(raw.clone()).map_err(|e| match e {
            LineageError::MalformedGrant { reason } => {
                LineageError::malformed(format!("{} '{}': {}", kind, entry.name, reason))
            }
            other => other,
        })?;
        if !seen.insert(grant.name().to_string()) {
            return Err(LineageError::malformed(format!(
                "{} '{}' grants '{}' more than once",
                kind,
                entry.name,
                grant.name()
            )));
        }
        grants.push(grant);
    }
    Ok(grants)
}

fn index_entries<'a>(
    kind: &str,
    entries: &'a [HolderEntry],
) -> LineageResult<BTreeMap<&'a str, &'a HolderEntry>> {
    let mut index = BTreeMap::new();
    for entry in entries {
        if entry.name.is_empty() {
            return Err(LineageError::ConfigError {
                reason: format!("a {} is declared without a name", kind),
            });
        }
        if entry.superuser && kind != "user" {
            return Err(LineageError::ConfigError {
                reason: format!("{} '{}' sets superuser, which only users may", kind, entry.name),
            });
        }
        if index.insert(entry.name.as_str(), entry).is_some() {
            return Err(LineageError::ConfigError {
                reason: format!("{} '{}' is declared more than once", kind, entry.name),
            });
        }
    }
    Ok(index)
}

/// Builds self-referencing groups (roles, plans) parents-first.
struct GroupBuilder<'a, T> {
    kind: &'static str,
    entries: BTreeMap<&'a str, &'a HolderEntry>,
    built: BTreeMap<String, Arc<T>>,
    stack: Vec<&'a str>,
}

impl<'a, T> GroupBuilder<'a, T> {
    fn new(kind: &'static str, entries: &'a [HolderEntry]) -> LineageResult<Self> {
        Ok(Self {
            kind,
            entries: index_entries(kind, entries)?,
            built: BTreeMap::new(),
            stack: Vec::new(),
        })
    }

    fn build_all<F>(mut self, make: F) -> LineageResult<BTreeMap<String, Arc<T>>>
    where
        F: Fn(&HolderEntry, Vec<Grant>, Vec<Arc<T>>) -> T,
    {
        let names: Vec<&'a str> = self.entries.keys().copied().collect();
        for name in names {
            self.build(name, &make)?;
        }
        Ok(self.built)
    }

    fn build<F>(&mut self, name: &'a str, make: &F) -> LineageResult<Arc<T>>
    where
        F: Fn(&HolderEntry, Vec<Grant>, Vec<Arc<T>>) -> T,
    {
        if let Some(done) = self.built.get(name) {
            return Ok(Arc::clone(done));
        }
        if let Some(start) = self.stack.iter().position(|pending| *pending == name) {
            let mut chain: Vec<String> =
                self.stack[start..].iter().map(|n| n.to_string()).collect();
            chain.push(name.to_string());
            return Err(LineageError::CyclicInheritance {
                holder: name.to_string(),
                chain,
            });
        }

        let entry = self.entries.get(name).copied().ok_or_else(|| LineageError::ConfigError {
            reason: format!("unknown {} '{}'", self.kind, name),
        })?;

        self.stack.push(name);
        let mut parents = Vec::with_capacity(entry.parents.len());
        for parent in &entry.parents {
            if !self.entries.contains_key(parent.as_str()) {
                self.stack.pop();
                return Err(LineageError::ConfigError {
                    reason: format!(
                        "{} '{}' inherits from unknown {} '{}'",
                        self.kind, name, self.kind, parent
                    ),
                });
            }
            match self.build(parent.as_str(), make) {
                Ok(built) => parents.push(built),
                Err(e) => {
                    self.stack.pop();
                    return Err(e);
                }
            }
        }
        self.stack.pop();

        let grants = convert_grants(self.kind, entry)?;
        debug!(kind = self.kind, holder = %name, parents = parents.len(), "built holder");

        let node = Arc::new(make(entry, grants, parents));
        self.built.insert(name.to_string(), Arc::clone(&node));
        Ok(node)
    }
}

/// Builds leaf holders (users, customers) against already-built groups.
fn build_members<T, G, F>(
    kind: &'static str,
    group_kind: &'static str,
    entries: &[HolderEntry],
    groups: &BTreeMap<String, Arc<G>>,
    make: F,
) -> LineageResult<BTreeMap<String, Arc<T>>>
where
    F: Fn(&HolderEntry, Vec<Grant>, Vec<Arc<G>>) -> T,
{
    let index = index_entries(kind, entries)?;
    let mut built = BTreeMap::new();
    for (name, entry) in index {
        let parents = entry
            .parents
            .iter()
            .map(|parent| {
                groups.get(parent).cloned().ok_or_else(|| LineageError::ConfigError {
                    reason: format!(
                        "{} '{}' references unknown {} '{}'",
                        kind, name, group_kind, parent
                    ),
                })
            })
            .collect::<LineageResult<Vec<_>>>()?;
        let grants = convert_grants(kind, entry)?;
        built.insert(name.to_string(), Arc::new(make(entry, grants, parents)));
    }
    Ok(built)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
