//! Error types for capability resolution.
//!
//! All fallible operations in lineage return `LineageResult<T>`. Absence of a
//! capability is never an error: it is the ordinary "not granted" answer.

use thiserror::Error;

/// The unified error type for the lineage crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    /// A grant is neither a bare name nor a name with a non-empty constraint set,
    /// or a holder lists the same capability twice among its direct grants.
    ///
    /// Boolean queries recover from this locally (the answer is `false`) and
    /// log it so the misconfiguration stays visible.
    #[error("malformed grant: {reason}")]
    MalformedGrant { reason: String },

    /// The parent graph reachable from a queried holder loops back on itself.
    ///
    /// `chain` lists the holders in flight when the loop was found, ending
    /// with the holder that was entered twice.
    #[error("cyclic inheritance at '{holder}': {}", .chain.join(" -> "))]
    CyclicInheritance { holder: String, chain: Vec<String> },

    /// A graph declaration is missing, unparsable, or refers to unknown holders.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl LineageError {
    /// Shorthand for building a `MalformedGrant` from any displayable reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGrant { reason: reason.into() }
    }

    /// Return true for errors a boolean query converts into a denial.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedGrant { .. })
    }
}

/// Convenience alias used throughout the lineage crates.
pub type LineageResult<T> = Result<T, LineageError>;
