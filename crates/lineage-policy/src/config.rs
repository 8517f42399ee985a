//! Graph declaration schema.
//!
//! A `GraphConfig` is deserialized from TOML (or JSON) and declares every
//! holder in a snapshot. Parents are referenced by name and may be declared
//! in any order; `Directory` resolves the references when it builds the
//! snapshot.
//!
//! Example:
//! ```toml
//! [[roles]]
//! name = "devs"
//! actions = ["deploy"]
//!
//! [[roles]]
//! name = "mods"
//! actions = [{ name = "ban_user", constraints = ["forum_x"] }]
//!
//! [[roles]]
//! name = "mega_mods"
//! roles = ["devs", "mods"]
//!
//! [[users]]
//! name = "alice"
//! roles = ["mega_mods"]
//! ```

use serde::{Deserialize, Serialize};

use lineage_contracts::grant::RawGrant;

/// One declared holder.
///
/// Field names follow the domain: roles and users list `actions` and
/// `roles`; plans and customers list `features` and `plans`. The generic
/// spellings `grants` and `parents` are accepted everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HolderEntry {
    /// Unique within its kind.
    pub name: String,

    /// Direct grants, each a bare name or a `{ name, constraints }` table.
    #[serde(default, alias = "actions", alias = "features")]
    pub grants: Vec<RawGrant>,

    /// Names of the holders this one inherits from.
    #[serde(default, alias = "roles", alias = "plans")]
    pub parents: Vec<String>,

    /// Bypasses every capability check. Accepted on users only; any other
    /// kind that sets it is rejected when the directory is built.
    #[serde(default)]
    pub superuser: bool,
}

/// The top-level structure of a graph declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    #[serde(default)]
    pub roles: Vec<HolderEntry>,

    #[serde(default)]
    pub users: Vec<HolderEntry>,

    #[serde(default)]
    pub plans: Vec<HolderEntry>,

    #[serde(default)]
    pub customers: Vec<HolderEntry>,
}
