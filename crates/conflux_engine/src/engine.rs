//! The computation engine.

use core::fmt;
use std::sync::Arc;

use conflux_graph::NodeSystem;

use crate::computation::{Computation, ComputationError};
use crate::report::Report;

/// Scheduling mode for computations launched by an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputationMode {
    /// At most one node computes at a time; given the same system and a
    /// deterministic context, the traversal order is deterministic.
    #[default]
    Sequential,
}

/// Launches computations over a shared, activated node system.
///
/// Engines are reusable: each [`compute`](Engine::compute) call builds a
/// fresh driver over the shared system, so concurrent calls against
/// independent contexts are safe.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(Arc::new(system), ComputationMode::Sequential)?;
///
/// let morning = engine.compute(morning_batch).await;
/// let evening = engine.compute(evening_batch).await;
/// ```
pub struct Engine<C> {
    system: Arc<NodeSystem<C>>,
    mode: ComputationMode,
}

impl<C> Engine<C> {
    /// Creates an engine over an activated system.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::NotActivated`] when the system has not
    /// been activated.
    pub fn new(
        system: Arc<NodeSystem<C>>,
        mode: ComputationMode,
    ) -> Result<Self, ComputationError> {
        if !system.is_activated() {
            return Err(ComputationError::NotActivated);
        }
        Ok(Self { system, mode })
    }

    /// The configured scheduling mode.
    #[must_use]
    pub fn mode(&self) -> ComputationMode {
        self.mode
    }

    /// The shared node system.
    #[must_use]
    pub fn system(&self) -> &Arc<NodeSystem<C>> {
        &self.system
    }

    /// Runs one computation against `context` and reports the outcome.
    pub async fn compute(&self, context: C) -> Report<C> {
        match self.mode {
            ComputationMode::Sequential => {
                Computation::over_activated(Arc::clone(&self.system), context)
                    .run()
                    .await
            }
        }
    }
}

impl<C> Clone for Engine<C> {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
            mode: self.mode,
        }
    }
}

impl<C> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.mode)
            .field("system", &self.system)
            .finish()
    }
}
