//! The constraint argument of a capability query.

/// What a caller asks about the constraints of a grant.
///
/// Passing no constraint is the same as `RequireUnconstrained`: the caller
/// wants a blanket grant and a constrained one does not satisfy it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintQuery<'a> {
    /// Only an unconstrained grant answers yes.
    #[default]
    RequireUnconstrained,
    /// Any grant answers yes; the caller only asks whether it is held at all.
    AnyConstraint,
    /// A blanket grant, or a constrained grant listing this token, answers yes.
    Token(&'a str),
}

impl<'a> From<&'a str> for ConstraintQuery<'a> {
    fn from(token: &'a str) -> Self {
        ConstraintQuery::Token(token)
    }
}

impl<'a> From<&'a String> for ConstraintQuery<'a> {
    fn from(token: &'a String) -> Self {
        ConstraintQuery::Token(token.as_str())
    }
}

impl<'a> From<Option<&'a str>> for ConstraintQuery<'a> {
    fn from(token: Option<&'a str>) -> Self {
        token.map_or(ConstraintQuery::RequireUnconstrained, ConstraintQuery::Token)
    }
}
