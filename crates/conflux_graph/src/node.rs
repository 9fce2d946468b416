//! Node handles and the compute contract.
//!
//! Nodes are the vertices of a workflow graph. Each node wraps a
//! user-supplied behavior and declares whether it may route on a branch
//! (decision node) or not (action node).

use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

pub use futures::future::BoxFuture;

use crate::state::ComputeState;

/// Contract for user-supplied node behavior.
///
/// A behavior runs against the computation's context and reports its outcome
/// as a [`ComputeState`]. It may mutate the context, but must be pure with
/// respect to other nodes: the only inter-node communication channel is the
/// context itself.
///
/// Synchronous behaviors are usually built through [`Node::action`] and
/// [`Node::decision`]; implement this trait directly when the behavior needs
/// to await.
///
/// # Example
///
/// ```ignore
/// struct FetchQuote;
///
/// impl Compute<Session> for FetchQuote {
///     fn compute<'a>(&'a self, ctx: &'a mut Session) -> BoxFuture<'a, ComputeState> {
///         Box::pin(async move {
///             match ctx.client.quote().await {
///                 Ok(quote) => {
///                     ctx.quote = Some(quote);
///                     ComputeState::new_continue()
///                 }
///                 Err(err) => ComputeState::new_abort(err),
///             }
///         })
///     }
/// }
/// ```
pub trait Compute<C>: Send + Sync {
    /// Runs this behavior against the computation context.
    fn compute<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, ComputeState>;
}

/// Adapter turning a synchronous closure into a [`Compute`] behavior.
struct FnBehavior<F> {
    func: F,
}

impl<C, F> Compute<C> for FnBehavior<F>
where
    F: Fn(&mut C) -> ComputeState + Send + Sync,
{
    fn compute<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, ComputeState> {
        let state = (self.func)(ctx);
        Box::pin(core::future::ready(state))
    }
}

/// Whether a node may route on a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Action,
    Decision,
}

struct NodeInner<C> {
    name: String,
    kind: NodeKind,
    behavior: Box<dyn Compute<C>>,
}

/// A node in a workflow graph.
///
/// `Node` is a cheap-to-clone handle with pointer identity: clones of the
/// same handle compare equal, two separately constructed nodes never do.
/// Identity is what the node system indexes by, so the same handle can be
/// linked from several places while staying a single vertex.
pub struct Node<C> {
    inner: Arc<NodeInner<C>>,
}

impl<C> Node<C> {
    /// Creates an action node from a synchronous closure.
    ///
    /// Action nodes may emit `Continue`, `Skip`, or `Abort`.
    pub fn action<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut C) -> ComputeState + Send + Sync + 'static,
    {
        Self::with_behavior(name, NodeKind::Action, FnBehavior { func })
    }

    /// Creates a decision node from a synchronous closure.
    ///
    /// Decision nodes may emit `Continue on <branch>`, `Skip`, or `Abort`;
    /// their outbound links carry the branch labels they route on.
    pub fn decision<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut C) -> ComputeState + Send + Sync + 'static,
    {
        Self::with_behavior(name, NodeKind::Decision, FnBehavior { func })
    }

    /// Creates an action node from a custom (possibly asynchronous) behavior.
    pub fn action_behavior<B>(name: impl Into<String>, behavior: B) -> Self
    where
        B: Compute<C> + 'static,
    {
        Self::with_behavior(name, NodeKind::Action, behavior)
    }

    /// Creates a decision node from a custom (possibly asynchronous) behavior.
    pub fn decision_behavior<B>(name: impl Into<String>, behavior: B) -> Self
    where
        B: Compute<C> + 'static,
    {
        Self::with_behavior(name, NodeKind::Decision, behavior)
    }

    fn with_behavior<B>(name: impl Into<String>, kind: NodeKind, behavior: B) -> Self
    where
        B: Compute<C> + 'static,
    {
        Self {
            inner: Arc::new(NodeInner {
                name: name.into(),
                kind,
                behavior: Box::new(behavior),
            }),
        }
    }

    /// Returns the node's name for debugging, tracing, and error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True iff this node may emit a branched continue.
    #[must_use]
    pub fn can_decide(&self) -> bool {
        self.inner.kind == NodeKind::Decision
    }

    /// Runs the node's behavior against `ctx`.
    pub fn compute<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, ComputeState> {
        self.inner.behavior.compute(ctx)
    }
}

impl<C> Clone for Node<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> PartialEq for Node<C> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<C> Eq for Node<C> {}

impl<C> Hash for Node<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .finish()
    }
}

impl<C> fmt::Display for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn action_nodes_cannot_decide() {
        let node = Node::<i32>::action("incr", |ctx| {
            *ctx += 1;
            ComputeState::new_continue()
        });
        assert_eq!(node.name(), "incr");
        assert!(!node.can_decide());
    }

    #[test]
    fn decision_nodes_can_decide() {
        let node = Node::<i32>::decision("positive", |ctx| {
            ComputeState::new_continue_on_branch(*ctx > 0)
        });
        assert!(node.can_decide());
    }

    #[test]
    fn identity_is_by_handle() {
        let node = Node::<i32>::action("a", |_| ComputeState::new_continue());
        let same = node.clone();
        let other = Node::<i32>::action("a", |_| ComputeState::new_continue());

        assert_eq!(node, same);
        assert_ne!(node, other);
    }

    #[test]
    fn handles_key_hash_maps() {
        let node = Node::<i32>::action("a", |_| ComputeState::new_continue());
        let mut map = hashbrown::HashMap::new();
        map.insert(node.clone(), 1);
        assert_eq!(map.get(&node), Some(&1));
    }

    #[test]
    fn compute_runs_the_closure() {
        let node = Node::<i32>::action("incr", |ctx| {
            *ctx += 1;
            ComputeState::new_continue()
        });
        let mut ctx = 41;
        let state = block_on(node.compute(&mut ctx));
        assert_eq!(state, ComputeState::new_continue());
        assert_eq!(ctx, 42);
    }

    #[test]
    fn compute_runs_async_behaviors() {
        struct Doubler;

        impl Compute<i32> for Doubler {
            fn compute<'a>(&'a self, ctx: &'a mut i32) -> BoxFuture<'a, ComputeState> {
                Box::pin(async move {
                    *ctx *= 2;
                    ComputeState::new_continue()
                })
            }
        }

        let node = Node::action_behavior("double", Doubler);
        let mut ctx = 21;
        let state = block_on(node.compute(&mut ctx));
        assert_eq!(state, ComputeState::new_continue());
        assert_eq!(ctx, 42);
    }

    #[test]
    fn display_is_the_name() {
        let node = Node::<i32>::decision("route", |_| ComputeState::new_skip());
        assert_eq!(format!("{node}"), "route");
    }
}
