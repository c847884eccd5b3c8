//! Invocation scope: cancellation tree and nesting depth.
//!
//! Every agent invocation runs under an [`InvocationScope`]. Nested agent
//! calls (an agent invoked as another agent's tool) get a child scope whose
//! cancellation token is derived from the parent's, so cancelling an outer
//! invocation reaches every in-flight backend task and nested call below it.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InvocationScope {
    pub invocation_id: Uuid,
    pub cancellation: CancellationToken,
    /// Zero for a top-level call, incremented per nested agent call.
    pub depth: u8,
}

impl InvocationScope {
    /// A root scope with a fresh cancellation token.
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// A root scope cancelled through `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            invocation_id: Uuid::now_v7(),
            cancellation: token,
            depth: 0,
        }
    }

    /// Scope for a nested agent call.
    ///
    /// Cancelling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self {
            invocation_id: Uuid::now_v7(),
            cancellation: self.cancellation.child_token(),
            depth: self.depth.saturating_add(1),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

impl Default for InvocationScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_increments_depth() {
        let root = InvocationScope::new();
        let child = root.child();
        let grandchild = child.child();
        assert_eq!(root.depth, 0);
        assert_eq!(child.depth, 1);
        assert_eq!(grandchild.depth, 2);
        assert_ne!(root.invocation_id, child.invocation_id);
    }

    #[test]
    fn test_cancel_parent_cancels_children() {
        let root = InvocationScope::new();
        let child = root.child();
        let grandchild = child.child();
        root.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn test_cancel_child_leaves_parent_running() {
        let root = InvocationScope::new();
        let child = root.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!root.is_cancelled());
    }
}
