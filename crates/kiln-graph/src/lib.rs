//! The shared, memoizing build-node registry.
//!
//! Process-scoped and concurrency-safe: the first caller to request an
//! identifier runs the construction function; every other caller, concurrent
//! or later, observes the identical node. No identifier is ever constructed
//! twice.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use kiln_core::TargetId;
use kiln_steps::Step;

/// An immutable record produced once per target identifier.
#[derive(Clone, Debug)]
pub struct BuildNode {
    pub id: TargetId,
    /// Declared dependency node identifiers, in order.
    pub deps: Vec<TargetId>,
    pub steps: Vec<Step>,
    /// The output artifact, if the node produces one.
    pub output: Option<PathBuf>,
    /// Artifacts to register with the cache.
    pub artifacts: Vec<PathBuf>,
}

type Slot = Arc<OnceCell<Arc<BuildNode>>>;

/// Target identifier -> build node, with get-or-create semantics.
#[derive(Default)]
pub struct BuildGraph {
    slots: Mutex<HashMap<TargetId, Slot>>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &TargetId) -> Slot {
        let mut slots = self.slots.lock();
        slots.entry(id.clone()).or_default().clone()
    }

    /// Get-or-create the node for `id`.
    ///
    /// Concurrent callers for the same identifier block until the single
    /// construction completes. The construction function may `insert` nodes
    /// for *other* identifiers while it runs; re-entering `get_or_create` for
    /// the identifier currently under construction would deadlock.
    pub fn get_or_create(
        &self,
        id: &TargetId,
        build: impl FnOnce(&TargetId) -> BuildNode,
    ) -> Arc<BuildNode> {
        self.slot(id).get_or_init(|| Arc::new(build(id))).clone()
    }

    /// Register a node constructed as a side effect of building another
    /// identifier. Registering an identifier twice is a contract violation.
    pub fn insert(&self, node: BuildNode) -> Arc<BuildNode> {
        let node = Arc::new(node);
        let slot = self.slot(&node.id);
        if slot.set(node.clone()).is_err() {
            panic!("build node constructed twice: {}", node.id);
        }
        node
    }

    /// Look up an already-constructed node.
    pub fn get(&self, id: &TargetId) -> Option<Arc<BuildNode>> {
        let slots = self.slots.lock();
        slots.get(id).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.get(id).is_some()
    }

    /// Identifiers with a constructed node, in arbitrary order.
    pub fn constructed_ids(&self) -> Vec<TargetId> {
        let slots = self.slots.lock();
        slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }
}
