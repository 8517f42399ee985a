//! Grants, constraint sets, and the merge rule.
//!
//! A grant names one capability (an action or a feature) and either applies
//! everywhere (`Unconstrained`) or only under a non-empty set of constraint
//! tokens (`ConstrainedTo`). An empty constraint set is not representable:
//! it is rejected as a malformed grant at construction time.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::error::{LineageError, LineageResult};
use crate::query::ConstraintQuery;

/// A non-empty, ordered set of constraint tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintSet(BTreeSet<String>);

impl ConstraintSet {
    /// Build a set from any collection of tokens.
    ///
    /// Fails with `MalformedGrant` if the collection is empty or contains an
    /// empty token.
    pub fn new<I, S>(tokens: I) -> LineageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for token in tokens {
            let token = token.into();
            if token.is_empty() {
                return Err(LineageError::malformed("constraint tokens must not be empty"));
            }
            set.insert(token);
        }
        if set.is_empty() {
            return Err(LineageError::malformed("constraint set must not be empty"));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with the standard collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set union. Both inputs are non-empty, so the result is too.
    pub fn union(&self, other: &ConstraintSet) -> ConstraintSet {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().collect::<Vec<_>>().join(", "))
    }
}

/// How far a grant reaches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraints {
    /// Blanket grant: applies under every constraint.
    Unconstrained,
    /// Applies only under the listed tokens.
    ConstrainedTo(ConstraintSet),
}

impl Constraints {
    /// Combine two grants of the same capability.
    ///
    /// - blanket with anything is blanket
    /// - two constrained grants union their token sets
    ///
    /// The rule is commutative and associative, so folding grants from any
    /// number of ancestors gives the same answer in any traversal order.
    pub fn merge(&self, other: &Constraints) -> Constraints {
        match (self, other) {
            (Constraints::Unconstrained, _) | (_, Constraints::Unconstrained) => {
                Constraints::Unconstrained
            }
            (Constraints::ConstrainedTo(a), Constraints::ConstrainedTo(b)) => {
                Constraints::ConstrainedTo(a.union(b))
            }
        }
    }

    /// Return true if an entry with these constraints answers `query` positively.
    ///
    /// - `RequireUnconstrained` demands a blanket grant.
    /// - `AnyConstraint` accepts any grant, constrained or not.
    /// - `Token(t)` accepts a blanket grant or a set containing `t`.
    pub fn satisfies(&self, query: ConstraintQuery<'_>) -> bool {
        match (self, query) {
            (Constraints::Unconstrained, _) => true,
            (Constraints::ConstrainedTo(_), ConstraintQuery::RequireUnconstrained) => false,
            (Constraints::ConstrainedTo(_), ConstraintQuery::AnyConstraint) => true,
            (Constraints::ConstrainedTo(set), ConstraintQuery::Token(token)) => set.contains(token),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Constraints::Unconstrained)
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraints::Unconstrained => f.write_str("unconstrained"),
            Constraints::ConstrainedTo(set) => write!(f, "constrained to {}", set),
        }
    }
}

/// One capability granted directly to a holder.
///
/// Immutable once constructed. Serializes as a bare name when unconstrained
/// and as a `{ name, constraints }` table otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGrant", into = "RawGrant")]
pub struct Grant {
    name: String,
    constraints: Constraints,
}

impl Grant {
    /// A blanket grant of `name`.
    pub fn unconstrained(name: impl Into<String>) -> LineageResult<Self> {
        Self::new(name, Constraints::Unconstrained)
    }

    /// A grant of `name` restricted to `tokens`.
    pub fn constrained<I, S>(name: impl Into<String>, tokens: I) -> LineageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, Constraints::ConstrainedTo(ConstraintSet::new(tokens)?))
    }

    pub fn new(name: impl Into<String>, constraints: Constraints) -> LineageResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LineageError::malformed("grant name must not be empty"));
        }
        Ok(Self { name, constraints })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}

/// The loosely-typed shape a grant takes in a declaration document.
///
/// Accepted shapes:
///
/// ```toml
/// grants = [
///     "deploy",                                     # unconstrained
///     { name = "ban_user", constraints = ["forum_x"] },
///     ["storage", ["1gb", "10gb"]],                 # (name, constraints) pair
/// ]
/// ```
///
/// Anything else lands in `Unrecognized` and fails conversion with
/// `MalformedGrant`, so a bad entry is reported as a grant problem rather than
/// a generic parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawGrant {
    Name(String),
    Scoped { name: String, constraints: Vec<String> },
    Pair(String, Vec<String>),
    #[serde(skip_serializing)]
    Unrecognized(IgnoredAny),
}

impl TryFrom<RawGrant> for Grant {
    type Error = LineageError;

    fn try_from(raw: RawGrant) -> LineageResult<Self> {
        match raw {
            RawGrant::Name(name) => Grant::unconstrained(name),
            RawGrant::Scoped { name, constraints } | RawGrant::Pair(name, constraints) => {
                if constraints.is_empty() {
                    return Err(LineageError::malformed(format!(
                        "grant '{}' has an empty constraint list",
                        name
                    )));
                }
                Grant::constrained(name, constraints)
            }
            RawGrant::Unrecognized(_) => Err(LineageError::malformed(
                "a grant must be a name or a (name, constraints) pair",
            )),
        }
    }
}

impl From<Grant> for RawGrant {
    fn from(grant: Grant) -> Self {
        match grant.constraints {
            Constraints::Unconstrained => RawGrant::Name(grant.name),
            Constraints::ConstrainedTo(set) => RawGrant::Scoped {
                name: grant.name,
                constraints: set.0.into_iter().collect(),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(tokens: &[&str]) -> Constraints {
        Constraints::ConstrainedTo(ConstraintSet::new(tokens.iter().copied()).unwrap())
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn empty_constraint_set_is_malformed() {
        let err = Grant::constrained("ban_user", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, LineageError::MalformedGrant { .. }));
    }

    #[test]
    fn empty_name_is_malformed() {
        assert!(Grant::unconstrained("").is_err());
        assert!(Grant::constrained("", ["forum_x"]).is_err());
    }

    #[test]
    fn empty_token_is_malformed() {
        assert!(ConstraintSet::new(["forum_x", ""]).is_err());
    }

    #[test]
    fn duplicate_tokens_collapse() {
        let set = ConstraintSet::new(["a", "b", "a"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "{a, b}");
    }

    // ── Merge rule ────────────────────────────────────────────────────────────

    #[test]
    fn blanket_dominates_constrained() {
        let blanket = Constraints::Unconstrained;
        let narrow = scoped(&["forum_x"]);
        assert_eq!(blanket.merge(&narrow), Constraints::Unconstrained);
        assert_eq!(narrow.merge(&blanket), Constraints::Unconstrained);
        assert_eq!(blanket.merge(&blanket), Constraints::Unconstrained);
    }

    #[test]
    fn constrained_sets_union() {
        let merged = scoped(&["x"]).merge(&scoped(&["y", "x"]));
        assert_eq!(merged, scoped(&["x", "y"]));
    }

    // ── Query satisfaction ────────────────────────────────────────────────────

    #[test]
    fn constrained_entry_answers_by_token() {
        let entry = scoped(&["x", "y"]);
        assert!(entry.satisfies(ConstraintQuery::Token("x")));
        assert!(!entry.satisfies(ConstraintQuery::Token("z")));
        assert!(!entry.satisfies(ConstraintQuery::RequireUnconstrained));
        assert!(entry.satisfies(ConstraintQuery::AnyConstraint));
    }

    #[test]
    fn blanket_entry_answers_everything() {
        let entry = Constraints::Unconstrained;
        assert!(entry.satisfies(ConstraintQuery::Token("anything")));
        assert!(entry.satisfies(ConstraintQuery::RequireUnconstrained));
        assert!(entry.satisfies(ConstraintQuery::AnyConstraint));
    }

    // ── Declaration shapes ────────────────────────────────────────────────────

    #[test]
    fn grant_accepts_all_declared_shapes() {
        let grants: Vec<Grant> = serde_json::from_str(
            r#"["deploy", {"name": "ban_user", "constraints": ["forum_x"]}, ["storage", ["1gb"]]]"#,
        )
        .unwrap();

        assert_eq!(grants[0], Grant::unconstrained("deploy").unwrap());
        assert_eq!(grants[1], Grant::constrained("ban_user", ["forum_x"]).unwrap());
        assert_eq!(grants[2], Grant::constrained("storage", ["1gb"]).unwrap());
    }

    #[test]
    fn unrecognized_shape_is_malformed() {
        let raw: RawGrant = serde_json::from_str("42").unwrap();
        match Grant::try_from(raw) {
            Err(LineageError::MalformedGrant { reason }) => {
                assert!(reason.contains("name or a (name, constraints) pair"));
            }
            other => panic!("expected MalformedGrant, got {:?}", other),
        }
    }

    #[test]
    fn empty_constraint_list_is_malformed_when_declared() {
        let raw: RawGrant =
            serde_json::from_str(r#"{"name": "ban_user", "constraints": []}"#).unwrap();
        assert!(matches!(
            Grant::try_from(raw),
            Err(LineageError::MalformedGrant { .. })
        ));
    }

    #[test]
    fn grant_serializes_to_compact_shape() {
        let json = serde_json::to_string(&Grant::unconstrained("deploy").unwrap()).unwrap();
        assert_eq!(json, r#""deploy""#);

        let json =
            serde_json::to_string(&Grant::constrained("ban_user", ["forum_y", "forum_x"]).unwrap())
                .unwrap();
        assert_eq!(json, r#"{"name":"ban_user","constraints":["forum_x","forum_y"]}"#);
    }
}
