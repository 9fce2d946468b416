//! The node system: builder, structural validators, and activation.
//!
//! A [`NodeSystem`] has a two-phase lifecycle. In the builder phase it is
//! mutable: nodes are declared, links are drawn, join modes are configured.
//! [`NodeSystem::activate`] runs the structural validators and, when they
//! all pass, freezes the system and builds the routing indices the
//! computation driver traverses: the initial-node set, the follow index,
//! and the ancestor index. After activation every mutator fails and the
//! system can be shared freely across concurrent computations.

use hashbrown::{HashMap, HashSet};

use crate::link::{JoinMode, Link};
use crate::node::Node;

/// Branch labels in bucket order: unlabeled first, then `true`, then `false`.
///
/// Iterating the three labels covers every follow or ancestor bucket of a
/// node; the driver relies on this order for deterministic scheduling.
pub const BRANCHES: [Option<bool>; 3] = [None, Some(true), Some(false)];

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors returned by builder mutations.
///
/// A failed mutation leaves the system unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// `add_node` on an activated system.
    #[error("can't add node, node system is freeze due to activation")]
    FrozenNode,
    /// `configure_join_mode` on an activated system.
    #[error("can't add node join mode, node system is freeze due to activation")]
    FrozenJoinMode,
    /// `add_link` or `add_link_on_branch` on an activated system.
    #[error("can't add branch link, node system is freeze due to activation")]
    FrozenLink,
    /// A link from a node to itself.
    #[error("can't have link on from and to the same node: {node}")]
    SelfLink {
        /// Name of the offending node.
        node: String,
    },
    /// An unlabeled link out of a decision node.
    #[error("can't have missing branch on link from decision node: {node}")]
    MissingBranch {
        /// Name of the decision node.
        node: String,
    },
    /// A branch-labeled link out of an action node.
    #[error("can't have not needed branch on link from action node: {node}")]
    UnneededBranch {
        /// Name of the action node.
        node: String,
    },
}

/// Structural defects detected by [`NodeSystem::validate`].
///
/// Validation runs every check unconditionally and reports every defect;
/// nothing short-circuits, so one call surfaces the full picture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A decision node with no outbound link.
    #[error("can't have decision node without link from it: {node}")]
    OrphanDecision {
        /// Name of the decision node.
        node: String,
    },
    /// A directed cycle in the link set.
    #[error("Can't have cycle in links between nodes: {walk}")]
    Cycle {
        /// The cycle walk, e.g. `a -> b -> a`.
        walk: String,
    },
    /// A link endpoint that was never declared via `add_node`.
    #[error("can't have undeclared node '{node}' as '{end}' of a link")]
    UndeclaredNode {
        /// Name of the undeclared node.
        node: String,
        /// Which endpoint of the link (`from` or `to`).
        end: &'static str,
    },
    /// A node declared more than once.
    #[error("can't have multiple instances ({count}) of a same node: {node}")]
    DuplicateNode {
        /// Name of the duplicated node.
        node: String,
        /// How many times the node was declared.
        count: usize,
    },
    /// A node with several inbound links and no join mode.
    #[error("can't have multiple links to a node without join mode: {node}")]
    MissingJoinMode {
        /// Name of the target node.
        node: String,
    },
}

/// Error returned when activating a system that fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("can't activate a unvalidated node system")]
pub struct ActivationError {
    errors: Vec<ValidationError>,
}

impl ActivationError {
    /// The validation errors that blocked activation.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

/// Errors returned by routing queries on a system that is not activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// `follow` before activation.
    #[error("can't follow a node if system is not activated")]
    FollowNotActivated,
    /// `ancestors` before activation.
    #[error("can't get ancestors of a node if system is not activated")]
    AncestorsNotActivated,
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing buckets
// ─────────────────────────────────────────────────────────────────────────────

/// Neighbor buckets keyed by branch label.
struct Routes<C> {
    unlabeled: Vec<Node<C>>,
    on_true: Vec<Node<C>>,
    on_false: Vec<Node<C>>,
}

impl<C> Routes<C> {
    fn new() -> Self {
        Self {
            unlabeled: Vec::new(),
            on_true: Vec::new(),
            on_false: Vec::new(),
        }
    }

    fn push(&mut self, branch: Option<bool>, node: Node<C>) {
        match branch {
            None => self.unlabeled.push(node),
            Some(true) => self.on_true.push(node),
            Some(false) => self.on_false.push(node),
        }
    }

    fn get(&self, branch: Option<bool>) -> &[Node<C>] {
        match branch {
            None => &self.unlabeled,
            Some(true) => &self.on_true,
            Some(false) => &self.on_false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NodeSystem
// ─────────────────────────────────────────────────────────────────────────────

/// A directed graph of nodes with a two-phase lifecycle.
///
/// # Example
///
/// ```ignore
/// let mut system = NodeSystem::new();
/// system.add_node(&fetch)?;
/// system.add_node(&check)?;
/// system.add_node(&store)?;
/// system.add_link(&fetch, &check)?;
/// system.add_link_on_branch(&check, &store, true)?;
/// system.activate()?;
/// ```
pub struct NodeSystem<C> {
    nodes: Vec<Node<C>>,
    links: Vec<Link<C>>,
    join_modes: HashMap<Node<C>, JoinMode>,
    activated: bool,
    initial_nodes: Vec<Node<C>>,
    follow_index: HashMap<Node<C>, Routes<C>>,
    ancestor_index: HashMap<Node<C>, Routes<C>>,
}

impl<C> Default for NodeSystem<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> NodeSystem<C> {
    /// Creates a new empty node system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            join_modes: HashMap::new(),
            activated: false,
            initial_nodes: Vec::new(),
            follow_index: HashMap::new(),
            ancestor_index: HashMap::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder API
    // ─────────────────────────────────────────────────────────────────────────

    /// Declares a node in the system.
    ///
    /// Declaring the same handle twice is not rejected here; the duplicate
    /// validator reports it.
    ///
    /// # Errors
    ///
    /// Fails on an activated system.
    pub fn add_node(&mut self, node: &Node<C>) -> Result<(), BuildError> {
        if self.activated {
            return Err(BuildError::FrozenNode);
        }
        self.nodes.push(node.clone());
        Ok(())
    }

    /// Links an action node to a successor.
    ///
    /// # Errors
    ///
    /// Fails on an activated system, on a self-link, or when `from` is a
    /// decision node (decision links carry a branch label).
    pub fn add_link(&mut self, from: &Node<C>, to: &Node<C>) -> Result<(), BuildError> {
        self.link(from, to, None)
    }

    /// Links a decision node to the successor reached when it takes `branch`.
    ///
    /// # Errors
    ///
    /// Fails on an activated system, on a self-link, or when `from` is an
    /// action node (action links are unlabeled).
    pub fn add_link_on_branch(
        &mut self,
        from: &Node<C>,
        to: &Node<C>,
        branch: bool,
    ) -> Result<(), BuildError> {
        self.link(from, to, Some(branch))
    }

    fn link(
        &mut self,
        from: &Node<C>,
        to: &Node<C>,
        branch: Option<bool>,
    ) -> Result<(), BuildError> {
        if self.activated {
            return Err(BuildError::FrozenLink);
        }
        if from == to {
            return Err(BuildError::SelfLink {
                node: from.name().to_owned(),
            });
        }
        if from.can_decide() && branch.is_none() {
            return Err(BuildError::MissingBranch {
                node: from.name().to_owned(),
            });
        }
        if !from.can_decide() && branch.is_some() {
            return Err(BuildError::UnneededBranch {
                node: from.name().to_owned(),
            });
        }
        self.links.push(Link::new(from.clone(), to.clone(), branch));
        Ok(())
    }

    /// Sets the join mode of `node`; the last write wins.
    ///
    /// The node does not have to be declared yet; the structural validator
    /// checks the final picture.
    ///
    /// # Errors
    ///
    /// Fails on an activated system.
    pub fn configure_join_mode(
        &mut self,
        node: &Node<C>,
        mode: JoinMode,
    ) -> Result<(), BuildError> {
        if self.activated {
            return Err(BuildError::FrozenJoinMode);
        }
        self.join_modes.insert(node.clone(), mode);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the declared nodes, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<C>] {
        &self.nodes
    }

    /// Returns the declared links, in declaration order.
    #[must_use]
    pub fn links(&self) -> &[Link<C>] {
        &self.links
    }

    /// Returns the number of declared nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of declared links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Returns true if the system has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true once the system has been activated.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Returns the configured join mode of `node`, or [`JoinMode::None`].
    #[must_use]
    pub fn join_mode_of(&self, node: &Node<C>) -> JoinMode {
        self.join_modes.get(node).copied().unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates the structure of the system.
    ///
    /// Five checks run unconditionally and every defect is collected:
    ///
    /// 1. decision nodes without an outbound link;
    /// 2. directed cycles, one error per distinct cycle (two cycles are the
    ///    same iff they contain the same links, regardless of where the
    ///    walk started);
    /// 3. link endpoints never declared via [`add_node`](Self::add_node);
    /// 4. nodes declared more than once;
    /// 5. nodes with several inbound links and no join mode.
    ///
    /// The check is pure: repeated calls return equal error lists.
    ///
    /// # Errors
    ///
    /// Returns every structural defect found, in check order.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.check_orphan_decisions(&mut errors);
        self.check_cycles(&mut errors);
        self.check_undeclared_endpoints(&mut errors);
        self.check_duplicate_nodes(&mut errors);
        self.check_unjoined_fan_in(&mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn check_orphan_decisions(&self, errors: &mut Vec<ValidationError>) {
        let mut seen: HashSet<Node<C>> = HashSet::new();
        for node in &self.nodes {
            if !node.can_decide() || !seen.insert(node.clone()) {
                continue;
            }
            if !self.links.iter().any(|link| link.from() == node) {
                errors.push(ValidationError::OrphanDecision {
                    node: node.name().to_owned(),
                });
            }
        }
    }

    fn check_cycles(&self, errors: &mut Vec<ValidationError>) {
        // Index nodes by identity. Links with undeclared endpoints are the
        // undeclared validator's business and are skipped here.
        let mut index: HashMap<Node<C>, usize> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            index.entry(node.clone()).or_insert(i);
        }
        let edges: Vec<(usize, usize)> = self
            .links
            .iter()
            .filter_map(|link| Some((*index.get(link.from())?, *index.get(link.to())?)))
            .collect();

        // Enumerates every walk out of `root`, recording those that close
        // back on it. A walk stops as soon as it revisits any other node.
        fn walk(
            root: usize,
            current: usize,
            edges: &[(usize, usize)],
            path: &mut Vec<usize>,
            visited: &mut Vec<usize>,
            cycles: &mut Vec<Vec<usize>>,
        ) {
            for (edge, (from, to)) in edges.iter().enumerate() {
                if *from != current {
                    continue;
                }
                if *to == root {
                    let mut cycle = path.clone();
                    cycle.push(edge);
                    cycles.push(cycle);
                    continue;
                }
                if visited.contains(to) {
                    continue;
                }
                visited.push(*to);
                path.push(edge);
                walk(root, *to, edges, path, visited, cycles);
                path.pop();
                visited.pop();
            }
        }

        let mut cycles = Vec::new();
        for (root, node) in self.nodes.iter().enumerate() {
            if index.get(node) != Some(&root) {
                continue; // duplicate declaration, already walked
            }
            let mut path = Vec::new();
            let mut visited = vec![root];
            walk(root, root, &edges, &mut path, &mut visited, &mut cycles);
        }

        // The same cycle is discovered once per node on it; deduplicate by
        // unordered link-set equality and report the first discovery.
        let mut reported: HashSet<Vec<usize>> = HashSet::new();
        for cycle in cycles {
            let mut key = cycle.clone();
            key.sort_unstable();
            if reported.insert(key) {
                errors.push(ValidationError::Cycle {
                    walk: self.cycle_walk(&cycle, &edges),
                });
            }
        }
    }

    fn cycle_walk(&self, cycle: &[usize], edges: &[(usize, usize)]) -> String {
        let mut names = Vec::with_capacity(cycle.len() + 1);
        names.push(self.nodes[edges[cycle[0]].0].name().to_owned());
        for edge in cycle {
            names.push(self.nodes[edges[*edge].1].name().to_owned());
        }
        names.join(" -> ")
    }

    fn check_undeclared_endpoints(&self, errors: &mut Vec<ValidationError>) {
        let declared: HashSet<Node<C>> = self.nodes.iter().cloned().collect();
        for link in &self.links {
            if !declared.contains(link.from()) {
                errors.push(ValidationError::UndeclaredNode {
                    node: link.from().name().to_owned(),
                    end: "from",
                });
            }
            if !declared.contains(link.to()) {
                errors.push(ValidationError::UndeclaredNode {
                    node: link.to().name().to_owned(),
                    end: "to",
                });
            }
        }
    }

    fn check_duplicate_nodes(&self, errors: &mut Vec<ValidationError>) {
        let mut counts: Vec<(Node<C>, usize)> = Vec::new();
        for node in &self.nodes {
            match counts.iter_mut().find(|entry| entry.0 == *node) {
                Some(entry) => entry.1 += 1,
                None => counts.push((node.clone(), 1)),
            }
        }
        for (node, count) in counts {
            if count > 1 {
                errors.push(ValidationError::DuplicateNode {
                    node: node.name().to_owned(),
                    count,
                });
            }
        }
    }

    fn check_unjoined_fan_in(&self, errors: &mut Vec<ValidationError>) {
        let mut seen: HashSet<Node<C>> = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.clone()) {
                continue;
            }
            let inbound = self.links.iter().filter(|link| link.to() == node).count();
            if inbound >= 2 && self.join_mode_of(node) == JoinMode::None {
                errors.push(ValidationError::MissingJoinMode {
                    node: node.name().to_owned(),
                });
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activation
    // ─────────────────────────────────────────────────────────────────────────

    /// Freezes the system and builds its routing indices.
    ///
    /// Activation is permitted only when [`validate`](Self::validate) finds
    /// no defect. An already-activated system returns `Ok` without change,
    /// so the call is idempotent.
    ///
    /// # Errors
    ///
    /// Returns an [`ActivationError`] retaining the validation errors.
    pub fn activate(&mut self) -> Result<(), ActivationError> {
        if self.activated {
            return Ok(());
        }
        if let Err(errors) = self.validate() {
            return Err(ActivationError { errors });
        }

        for link in &self.links {
            self.follow_index
                .entry(link.from().clone())
                .or_insert_with(Routes::new)
                .push(link.branch(), link.to().clone());
            self.ancestor_index
                .entry(link.to().clone())
                .or_insert_with(Routes::new)
                .push(link.branch(), link.from().clone());
        }

        let targets: HashSet<Node<C>> = self.links.iter().map(|link| link.to().clone()).collect();
        self.initial_nodes = self
            .nodes
            .iter()
            .filter(|node| !targets.contains(*node))
            .cloned()
            .collect();

        self.activated = true;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Routing queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the nodes no link targets, in declaration order.
    ///
    /// These are the roots a computation starts from. Empty before
    /// activation.
    #[must_use]
    pub fn initial_nodes(&self) -> &[Node<C>] {
        &self.initial_nodes
    }

    /// Returns the direct successors of `node` reached on `branch`.
    ///
    /// Use `None` for links out of action nodes. Returns an empty slice
    /// when nothing matches.
    ///
    /// # Errors
    ///
    /// Fails if the system is not activated.
    pub fn follow(&self, node: &Node<C>, branch: Option<bool>) -> Result<&[Node<C>], QueryError> {
        if !self.activated {
            return Err(QueryError::FollowNotActivated);
        }
        Ok(self
            .follow_index
            .get(node)
            .map_or(&[], |routes| routes.get(branch)))
    }

    /// Returns the direct predecessors linked to `node` on `branch`.
    ///
    /// Returns an empty slice when nothing matches.
    ///
    /// # Errors
    ///
    /// Fails if the system is not activated.
    pub fn ancestors(
        &self,
        node: &Node<C>,
        branch: Option<bool>,
    ) -> Result<&[Node<C>], QueryError> {
        if !self.activated {
            return Err(QueryError::AncestorsNotActivated);
        }
        Ok(self
            .ancestor_index
            .get(node)
            .map_or(&[], |routes| routes.get(branch)))
    }
}

impl<C> core::fmt::Debug for NodeSystem<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeSystem")
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("activated", &self.activated)
            .finish()
    }
}
