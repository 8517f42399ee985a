//! In-memory holders shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use lineage_contracts::grant::Grant;

use crate::resolver::GrantCache;
use crate::traits::CapabilityHolder;

pub(crate) fn blanket(name: &str) -> Grant {
    Grant::unconstrained(name).unwrap()
}

pub(crate) fn scoped(name: &str, tokens: &[&str]) -> Grant {
    Grant::constrained(name, tokens.iter().copied()).unwrap()
}

/// A holder whose parents can be linked after construction, so tests can
/// build cyclic graphs.
#[derive(Default)]
pub(crate) struct Node {
    name: String,
    grants: Vec<Grant>,
    parents: OnceLock<Vec<Arc<Node>>>,
    superuser: bool,
    cache: GrantCache,
    /// Number of times `parents()` has been called.
    pub(crate) parent_walks: AtomicUsize,
}

impl Node {
    pub(crate) fn new(name: &str, grants: Vec<Grant>) -> Arc<Node> {
        Arc::new(Node {
            name: name.to_string(),
            grants,
            ..Node::default()
        })
    }

    pub(crate) fn with_parents(
        name: &str,
        grants: Vec<Grant>,
        parents: Vec<Arc<Node>>,
    ) -> Arc<Node> {
        let node = Node::new(name, grants);
        node.link(parents);
        node
    }

    pub(crate) fn superuser(name: &str, parents: Vec<Arc<Node>>) -> Arc<Node> {
        let node = Arc::new(Node {
            name: name.to_string(),
            superuser: true,
            ..Node::default()
        });
        node.link(parents);
        node
    }

    /// Set the parent list. Only the first call has any effect.
    pub(crate) fn link(&self, parents: Vec<Arc<Node>>) {
        let _ = self.parents.set(parents);
    }

    pub(crate) fn holder(&self) -> &dyn CapabilityHolder {
        self
    }
}

impl CapabilityHolder for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn direct_grants(&self) -> &[Grant] {
        &self.grants
    }

    fn parents(&self) -> Vec<&dyn CapabilityHolder> {
        self.parent_walks.fetch_add(1, Ordering::SeqCst);
        self.parents
            .get()
            .map(|parents| parents.iter().map(|p| &**p as &dyn CapabilityHolder).collect())
            .unwrap_or_default()
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn grant_cache(&self) -> &GrantCache {
        &self.cache
    }
}
