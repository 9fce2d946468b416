//! The computation driver.
//!
//! A [`Computation`] traverses one activated
//! [`NodeSystem`] for one context value. The traversal starts at the
//! initial nodes and moves along the links each resolved state routes on,
//! honoring the join mode of every multi-input node. It terminates when no
//! node can resolve anymore or when a node aborts, and reports the outcome
//! as a [`Report`].

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;

use conflux_graph::system::BRANCHES;
use conflux_graph::{AbortError, ComputeState, JoinMode, Node, NodeSystem};

use crate::report::Report;

/// Errors constructing a driver or an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComputationError {
    /// The node system has not been activated.
    #[error("can't run a computation on a node system that is not activated")]
    NotActivated,
}

/// Gate status of a node under its join mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Every required ancestor routes here; the node may compute.
    Open,
    /// All ancestors resolved and at least one does not route; the node
    /// resolves to `Skip` without computing.
    Closed,
    /// Some ancestor could still change the outcome; evaluate again later.
    Blocked,
}

/// A single traversal of an activated node system for one context value.
///
/// The computation owns its context; [`run`](Computation::run) consumes the
/// driver and hands the mutated context back inside the report.
///
/// # Example
///
/// ```ignore
/// let computation = Computation::new(Arc::clone(&system), context)?;
/// let report = computation.run().await;
/// ```
pub struct Computation<C> {
    system: Arc<NodeSystem<C>>,
    context: C,
    states: HashMap<Node<C>, ComputeState>,
    queue: VecDeque<Node<C>>,
    abort: Option<AbortError>,
}

impl<C> std::fmt::Debug for Computation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computation")
            .field("states", &self.states.len())
            .field("queue", &self.queue.len())
            .field("abort", &self.abort)
            .finish()
    }
}

impl<C> Computation<C> {
    /// Creates a driver over an activated system.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::NotActivated`] when the system has not
    /// been activated.
    pub fn new(system: Arc<NodeSystem<C>>, context: C) -> Result<Self, ComputationError> {
        if !system.is_activated() {
            return Err(ComputationError::NotActivated);
        }
        Ok(Self::over_activated(system, context))
    }

    /// Constructor for callers that already guarantee activation.
    pub(crate) fn over_activated(system: Arc<NodeSystem<C>>, context: C) -> Self {
        Self {
            system,
            context,
            states: HashMap::new(),
            queue: VecDeque::new(),
            abort: None,
        }
    }

    /// Runs the traversal to completion.
    ///
    /// Nodes resolve at most once. A node computes when its join gate is
    /// open; an `And` gate whose ancestors all resolved without all routing
    /// resolves the node to `Skip` without computing it. The first abort
    /// stops all further scheduling.
    pub async fn run(mut self) -> Report<C> {
        for node in self.system.initial_nodes() {
            self.queue.push_back(node.clone());
        }

        while let Some(node) = self.queue.pop_front() {
            if self.states.contains_key(&node) {
                continue;
            }
            match self.gate(&node) {
                Gate::Blocked => {}
                Gate::Closed => {
                    tracing::debug!(node = %node, "join gate closed, node skipped");
                    self.states.insert(node.clone(), ComputeState::new_skip());
                    self.enqueue_followers(&node);
                }
                Gate::Open => {
                    let state = self.invoke(&node).await;
                    tracing::debug!(node = %node, state = %state, "node resolved");
                    if let ComputeState::Abort(error) = &state {
                        tracing::warn!(node = %node, error = %error, "computation aborted");
                        if self.abort.is_none() {
                            self.abort = Some(error.clone());
                        }
                        self.states.insert(node, state);
                        break;
                    }
                    self.states.insert(node.clone(), state);
                    self.enqueue_followers(&node);
                }
            }
        }

        tracing::debug!(
            resolved = self.states.len(),
            success = self.abort.is_none(),
            "computation complete"
        );
        Report {
            success: self.abort.is_none(),
            states: self.states,
            context: self.context,
            error: self.abort,
        }
    }

    /// Evaluates `node`'s join gate against the resolved states.
    ///
    /// Pure over the states map and the activated indices, so a parallel
    /// dispatcher could reuse it unchanged.
    fn gate(&self, node: &Node<C>) -> Gate {
        let mut total = 0usize;
        let mut resolved = 0usize;
        let mut routing = 0usize;
        for branch in BRANCHES {
            for ancestor in self.system.ancestors(node, branch).unwrap_or(&[]) {
                total += 1;
                if let Some(state) = self.states.get(ancestor) {
                    resolved += 1;
                    if state.routes_on(branch) {
                        routing += 1;
                    }
                }
            }
        }

        // Initial nodes have no gate.
        if total == 0 {
            return Gate::Open;
        }

        match self.system.join_mode_of(node) {
            // Validation caps `None` targets at one inbound link, making it
            // the single-ancestor case of `Or`: open once the route exists,
            // permanently blocked when the ancestor resolved elsewhere.
            JoinMode::None | JoinMode::Or => {
                if routing > 0 {
                    Gate::Open
                } else {
                    Gate::Blocked
                }
            }
            JoinMode::And => {
                if resolved < total {
                    Gate::Blocked
                } else if routing == total {
                    Gate::Open
                } else {
                    Gate::Closed
                }
            }
        }
    }

    /// Computes `node`, converting misused continue variants into aborts.
    async fn invoke(&mut self, node: &Node<C>) -> ComputeState {
        tracing::debug!(node = %node, "computing node");
        let state = node.compute(&mut self.context).await;
        if node.can_decide() && matches!(state, ComputeState::Continue(None)) {
            return ComputeState::new_abort("decision node must choose a branch");
        }
        if !node.can_decide() && matches!(state, ComputeState::Continue(Some(_))) {
            return ComputeState::new_abort("action node can't continue on a branch");
        }
        state
    }

    /// Queues every successor of `node` for (re-)evaluation.
    ///
    /// All branch buckets are queued, not only the routed ones: a successor
    /// behind an `And` gate must learn about non-routing ancestors to
    /// resolve to `Skip`. The gate decides what actually happens.
    fn enqueue_followers(&mut self, node: &Node<C>) {
        for branch in BRANCHES {
            for next in self.system.follow(node, branch).unwrap_or(&[]) {
                if !self.states.contains_key(next) {
                    self.queue.push_back(next.clone());
                }
            }
        }
    }
}
