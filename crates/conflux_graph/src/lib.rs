//! Node system primitives for Conflux (Layer 1).
//!
//! `conflux_graph` provides the static half of the workflow engine: nodes,
//! links, join modes, and the [`NodeSystem`] that assembles them, validates
//! their structure, and activates them into an immutable routing structure.
//!
//! # Core Concepts
//!
//! - [`Node`] - Action and decision vertices with pointer identity
//! - [`Link`] - Directed connections, optionally labeled with a branch
//! - [`JoinMode`] - Policy combining multiple inbound links (none/and/or)
//! - [`ComputeState`] - The outcome a node reports for one computation
//! - [`NodeSystem`] - Mutable builder frozen by activation into routing
//!   indices (initial nodes, follow, ancestors)
//!
//! # Example
//!
//! ```ignore
//! use conflux_graph::{ComputeState, Node, NodeSystem};
//!
//! let load = Node::action("load", |ctx: &mut Vec<i32>| {
//!     ctx.push(1);
//!     ComputeState::new_continue()
//! });
//! let check = Node::decision("check", |ctx: &mut Vec<i32>| {
//!     ComputeState::new_continue_on_branch(ctx.len() > 0)
//! });
//!
//! let mut system = NodeSystem::new();
//! system.add_node(&load)?;
//! system.add_node(&check)?;
//! system.add_link(&load, &check)?;
//! system.activate()?;
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Conflux architecture:
//!
//! - **Layer 1** (`conflux_graph`): graph structure and activation (this crate)
//! - **Layer 2** (`conflux_engine`): computation driver, engine, and report

/// Links between nodes and join-mode policies.
pub mod link;

/// Node handles and the compute contract.
pub mod node;

/// Compute states emitted by node behaviors.
pub mod state;

/// The node system: builder, structural validators, and activation.
pub mod system;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::link::{JoinMode, Link};
    pub use crate::node::{BoxFuture, Compute, Node};
    pub use crate::state::{AbortError, ComputeState};
    pub use crate::system::{
        ActivationError, BRANCHES, BuildError, NodeSystem, QueryError, ValidationError,
    };
}

// Re-export key types at crate root for convenience
pub use link::{JoinMode, Link};
pub use node::{BoxFuture, Compute, Node};
pub use state::{AbortError, ComputeState};
pub use system::{ActivationError, BuildError, NodeSystem, QueryError, ValidationError};
