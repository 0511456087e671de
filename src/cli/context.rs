//! Dispatch context handed to command handlers
//!
//! A context carries a cancellation token and an optional deadline. The
//! dispatcher never looks at either; handlers decide how to honor them.

use crate::error::ContextError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellable, deadline-bearing context
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Cancelling this token cancels every context derived from it
    token: CancellationToken,

    /// Point in time after which the context counts as expired
    deadline: Option<Instant>,
}

impl Context {
    /// Create a live context with no deadline
    pub fn new() -> Self {
        Context {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a child context that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that expires at `deadline`
    ///
    /// A child never outlives its parent: the earlier of the two deadlines wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Context {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that is cancelled along with this one
    pub fn child(&self) -> Self {
        Context {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled or its deadline has passed
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; `None` without a deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Why the context is no longer live, if it isn't
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Ok` while the context is live
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The underlying token, for handlers that hand it to other code
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new_is_live() {
        let ctx = Context::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let parent = Context::new();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
        assert_eq!(grandchild.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn test_cancel_child_leaves_parent_live() {
        let parent = Context::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::new().with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_child_cannot_extend_deadline() {
        let parent = Context::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_child_may_shorten_deadline() {
        let parent = Context::new().with_timeout(Duration::from_secs(3600));
        let child = parent.with_timeout(Duration::from_secs(1));
        assert!(child.deadline() < parent.deadline());
    }
}
