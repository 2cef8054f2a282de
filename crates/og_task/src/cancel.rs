use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

// -----------------------------------------------------------------------------
// Cancelled

/// Returned by [`CancelToken::check`] once the token has been cancelled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("the operation was cancelled")]
pub struct Cancelled;

// -----------------------------------------------------------------------------
// CancelToken

/// A shared cancellation flag.
///
/// Clones observe the same flag. A traversal holding a token calls
/// [`check`](Self::check) at each suspension point and unwinds with
/// [`Cancelled`] once any clone has called [`cancel`](Self::cancel).
///
/// # Examples
///
/// ```
/// use og_task::{CancelToken, Cancelled};
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert_eq!(token.check(), Ok(()));
///
/// assert!(handle.cancel());
/// assert!(!token.cancel());
/// assert!(token.is_cancelled());
/// assert_eq!(token.check(), Err(Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Returns `true` for the call that flipped the flag, `false` if the
    /// token was already cancelled.
    #[inline]
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` if cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, Cancelled};

    #[test]
    fn only_the_first_cancel_flips_the_flag() {
        let token = CancelToken::new();
        let clones = [token.clone(), token.clone(), token.clone()];
        let flipped = clones.iter().filter(|clone| clone.cancel()).count();
        assert_eq!(flipped, 1);
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let first = CancelToken::new();
        let second = CancelToken::default();
        first.cancel();
        assert!(first.is_cancelled());
        assert_eq!(second.check(), Ok(()));
    }
}
