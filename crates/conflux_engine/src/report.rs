//! Computation reports.

use conflux_graph::{AbortError, ComputeState, Node};
use hashbrown::HashMap;

/// The aggregated outcome of one computation.
#[derive(Debug)]
pub struct Report<C> {
    /// True iff no node aborted.
    pub success: bool,
    /// Final state of every node that resolved during the traversal.
    ///
    /// Nodes that never became eligible are absent, not implicitly skipped.
    pub states: HashMap<Node<C>, ComputeState>,
    /// The context after every mutation made by the resolved nodes.
    pub context: C,
    /// The first abort's error, when `success` is false.
    pub error: Option<AbortError>,
}

impl<C> Report<C> {
    /// Returns the resolved state of `node`, if any.
    #[must_use]
    pub fn state_of(&self, node: &Node<C>) -> Option<&ComputeState> {
        self.states.get(node)
    }
}
