//! A workflow engine executing directed graphs of computation steps.
//!
//! Assemble a [`NodeSystem`] out of action and decision [`Node`]s, activate
//! it, then hand it to an [`Engine`] to run one [`Computation`] per context
//! value. See `conflux_graph` (structure) and `conflux_engine` (execution)
//! for the full API.

pub use conflux_engine::{Computation, ComputationError, ComputationMode, Engine, Report};
pub use conflux_graph::{
    AbortError, ActivationError, BoxFuture, BuildError, Compute, ComputeState, JoinMode, Link,
    Node, NodeSystem, QueryError, ValidationError,
};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use conflux_engine::prelude::*;
}
