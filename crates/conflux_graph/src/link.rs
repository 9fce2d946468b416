//! Links between nodes and join-mode policies.
//!
//! Links are the directed connections of a workflow graph. A link carries a
//! branch label iff its source is a decision node; the label selects which
//! decision outcome routes along it.

use core::fmt;

use crate::node::Node;

/// Policy governing when a node with multiple inbound links becomes
/// eligible.
///
/// The mode is attached to the *target* node through
/// [`NodeSystem::configure_join_mode`](crate::system::NodeSystem::configure_join_mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinMode {
    /// No combination applies; the node may have at most one inbound link.
    #[default]
    None,
    /// Every inbound link must route to the node.
    And,
    /// At least one inbound link must route to the node; the node still
    /// computes at most once.
    Or,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::None => f.write_str("none"),
            JoinMode::And => f.write_str("and"),
            JoinMode::Or => f.write_str("or"),
        }
    }
}

/// A directed link between two nodes, optionally labeled with a branch.
pub struct Link<C> {
    from: Node<C>,
    to: Node<C>,
    branch: Option<bool>,
}

impl<C> Link<C> {
    pub(crate) fn new(from: Node<C>, to: Node<C>, branch: Option<bool>) -> Self {
        Self { from, to, branch }
    }

    /// Returns the source node.
    #[must_use]
    pub fn from(&self) -> &Node<C> {
        &self.from
    }

    /// Returns the target node.
    #[must_use]
    pub fn to(&self) -> &Node<C> {
        &self.to
    }

    /// Returns the branch label, present iff the source is a decision node.
    #[must_use]
    pub fn branch(&self) -> Option<bool> {
        self.branch
    }
}

impl<C> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            branch: self.branch,
        }
    }
}

impl<C> PartialEq for Link<C> {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.branch == other.branch
    }
}

impl<C> Eq for Link<C> {}

impl<C> fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("from", &self.from.name())
            .field("to", &self.to.name())
            .field("branch", &self.branch)
            .finish()
    }
}

impl<C> fmt::Display for Link<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.branch {
            Some(branch) => write!(f, "{} -({branch})-> {}", self.from, self.to),
            None => write!(f, "{} -> {}", self.from, self.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ComputeState;

    fn action(name: &str) -> Node<()> {
        Node::action(name, |_| ComputeState::new_continue())
    }

    #[test]
    fn join_mode_defaults_to_none() {
        assert_eq!(JoinMode::default(), JoinMode::None);
    }

    #[test]
    fn join_mode_display() {
        assert_eq!(format!("{}", JoinMode::None), "none");
        assert_eq!(format!("{}", JoinMode::And), "and");
        assert_eq!(format!("{}", JoinMode::Or), "or");
    }

    #[test]
    fn link_display_with_and_without_branch() {
        let a = action("a");
        let b = action("b");
        assert_eq!(
            format!("{}", Link::new(a.clone(), b.clone(), None)),
            "a -> b"
        );
        assert_eq!(
            format!("{}", Link::new(a, b, Some(true))),
            "a -(true)-> b"
        );
    }

    #[test]
    fn link_equality_follows_endpoints_and_branch() {
        let a = action("a");
        let b = action("b");
        let unlabeled = Link::new(a.clone(), b.clone(), None);

        assert_eq!(unlabeled, unlabeled.clone());
        assert_ne!(unlabeled, Link::new(a.clone(), b.clone(), Some(true)));
        assert_ne!(unlabeled, Link::new(b, a, None));
    }
}
