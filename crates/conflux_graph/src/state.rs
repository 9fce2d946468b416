//! Compute states emitted by node behaviors.
//!
//! Every node resolves to exactly one [`ComputeState`] per computation. The
//! state carries the routing decision: plain continues follow unlabeled
//! links, branched continues follow the matching labeled links, skips and
//! aborts follow nothing.

use core::fmt;

/// Error carried by [`ComputeState::Abort`].
///
/// Abort errors travel through the computation report rather than through
/// `Result` returns. Two abort errors are equal iff their messages are.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AbortError {
    message: String,
}

impl AbortError {
    /// Creates an abort error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for AbortError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for AbortError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The outcome of one node's computation.
///
/// Action nodes may emit `Continue(None)`, `Skip`, or `Abort`; decision
/// nodes may emit `Continue(Some(_))`, `Skip`, or `Abort`. The driver
/// converts a misused variant into an `Abort`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeState {
    /// The node succeeded. Without a branch the traversal proceeds along
    /// unlabeled outbound links; with a branch `b` it proceeds only along
    /// outbound links labeled `b`.
    Continue(Option<bool>),
    /// The node voluntarily abstained; downstream treats it as "did not
    /// emit success".
    Skip,
    /// The node failed; the whole computation aborts.
    Abort(AbortError),
}

impl ComputeState {
    /// Plain success, for action nodes.
    #[must_use]
    pub fn new_continue() -> Self {
        Self::Continue(None)
    }

    /// Branched success, for decision nodes.
    #[must_use]
    pub fn new_continue_on_branch(branch: bool) -> Self {
        Self::Continue(Some(branch))
    }

    /// Voluntary abstention.
    #[must_use]
    pub fn new_skip() -> Self {
        Self::Skip
    }

    /// Failure carrying `error`; aborts the whole computation.
    pub fn new_abort(error: impl fmt::Display) -> Self {
        Self::Abort(AbortError::new(error.to_string()))
    }

    /// The branch taken by a branched continue, if any.
    #[must_use]
    pub fn branch(&self) -> Option<bool> {
        match self {
            Self::Continue(branch) => *branch,
            Self::Skip | Self::Abort(_) => None,
        }
    }

    /// True for both plain and branched continues.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// True iff the node abstained.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// True iff the node failed.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }

    /// The abort error, when this state is an abort.
    #[must_use]
    pub fn abort_error(&self) -> Option<&AbortError> {
        match self {
            Self::Abort(error) => Some(error),
            Self::Continue(_) | Self::Skip => None,
        }
    }

    /// Whether this state permits traversal along a link labeled `branch`.
    ///
    /// A plain continue routes along unlabeled links, a branched continue
    /// along links carrying the same label. Skips and aborts never route.
    #[must_use]
    pub fn routes_on(&self, branch: Option<bool>) -> bool {
        match self {
            Self::Continue(taken) => *taken == branch,
            Self::Skip | Self::Abort(_) => false,
        }
    }
}

impl fmt::Display for ComputeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue(None) => write!(f, "Continue"),
            Self::Continue(Some(branch)) => write!(f, "Continue on {branch}"),
            Self::Skip => write!(f, "Skip"),
            Self::Abort(error) => write!(f, "Abort on {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms_are_stable() {
        assert_eq!(format!("{}", ComputeState::new_continue()), "Continue");
        assert_eq!(
            format!("{}", ComputeState::new_continue_on_branch(true)),
            "Continue on true"
        );
        assert_eq!(
            format!("{}", ComputeState::new_continue_on_branch(false)),
            "Continue on false"
        );
        assert_eq!(format!("{}", ComputeState::new_skip()), "Skip");
        assert_eq!(format!("{}", ComputeState::new_abort("boom")), "Abort on boom");
    }

    #[test]
    fn equality_follows_tags_and_branches() {
        assert_eq!(ComputeState::new_continue(), ComputeState::new_continue());
        assert_ne!(
            ComputeState::new_continue_on_branch(true),
            ComputeState::new_continue_on_branch(false)
        );
        assert_ne!(ComputeState::new_continue(), ComputeState::new_skip());
        assert_ne!(
            ComputeState::new_continue(),
            ComputeState::new_continue_on_branch(true)
        );
    }

    #[test]
    fn abort_equality_compares_messages() {
        assert_eq!(
            ComputeState::new_abort("boom"),
            ComputeState::new_abort("boom")
        );
        assert_ne!(
            ComputeState::new_abort("boom"),
            ComputeState::new_abort("bang")
        );
    }

    #[test]
    fn branch_accessor() {
        assert_eq!(ComputeState::new_continue().branch(), None);
        assert_eq!(
            ComputeState::new_continue_on_branch(false).branch(),
            Some(false)
        );
        assert_eq!(ComputeState::new_skip().branch(), None);
    }

    #[test]
    fn routing_matches_branch_labels() {
        assert!(ComputeState::new_continue().routes_on(None));
        assert!(!ComputeState::new_continue().routes_on(Some(true)));

        assert!(ComputeState::new_continue_on_branch(true).routes_on(Some(true)));
        assert!(!ComputeState::new_continue_on_branch(true).routes_on(Some(false)));
        assert!(!ComputeState::new_continue_on_branch(true).routes_on(None));

        assert!(!ComputeState::new_skip().routes_on(None));
        assert!(!ComputeState::new_abort("boom").routes_on(None));
    }

    #[test]
    fn abort_error_accessor() {
        let state = ComputeState::new_abort("boom");
        assert_eq!(state.abort_error().map(AbortError::message), Some("boom"));
        assert_eq!(ComputeState::new_skip().abort_error(), None);
    }
}
