//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout as it moves through the saga.
///
/// State transitions:
/// ```text
/// Fetching ──► Verifying ──► Transferring ──► Recording ──► Cleaning ──► Done
///     │            │              │               │             │
///     └────────────┴──────────────┴───────────────┴─────────────┴──► Aborted
/// ```
///
/// `Transferring` is the compensable phase; once `Recording` succeeds the
/// saga never re-runs or reverses transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Loading the caller's cart.
    #[default]
    Fetching,

    /// Advisory account and balance verification.
    Verifying,

    /// Executing transfer legs sequentially.
    Transferring,

    /// Inserting the immutable order record (point of no return).
    Recording,

    /// Deleting the cart document.
    Cleaning,

    /// Checkout finished successfully (terminal state).
    Done,

    /// Checkout failed and any applied legs were compensated
    /// (terminal state).
    Aborted,
}

impl CheckoutState {
    /// Returns true if a failure in this state may require compensating
    /// already-applied transfer legs.
    pub fn is_compensable(&self) -> bool {
        matches!(self, CheckoutState::Transferring | CheckoutState::Recording)
    }

    /// Returns true if transfers must never be re-run or reversed after a
    /// failure in this state.
    pub fn is_past_point_of_no_return(&self) -> bool {
        matches!(self, CheckoutState::Cleaning | CheckoutState::Done)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Done | CheckoutState::Aborted)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Fetching => "Fetching",
            CheckoutState::Verifying => "Verifying",
            CheckoutState::Transferring => "Transferring",
            CheckoutState::Recording => "Recording",
            CheckoutState::Cleaning => "Cleaning",
            CheckoutState::Done => "Done",
            CheckoutState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_fetching() {
        assert_eq!(CheckoutState::default(), CheckoutState::Fetching);
    }

    #[test]
    fn compensable_states() {
        assert!(!CheckoutState::Fetching.is_compensable());
        assert!(!CheckoutState::Verifying.is_compensable());
        assert!(CheckoutState::Transferring.is_compensable());
        assert!(CheckoutState::Recording.is_compensable());
        assert!(!CheckoutState::Cleaning.is_compensable());
    }

    #[test]
    fn point_of_no_return() {
        assert!(!CheckoutState::Transferring.is_past_point_of_no_return());
        assert!(!CheckoutState::Recording.is_past_point_of_no_return());
        assert!(CheckoutState::Cleaning.is_past_point_of_no_return());
        assert!(CheckoutState::Done.is_past_point_of_no_return());
    }

    #[test]
    fn terminal_states() {
        assert!(!CheckoutState::Fetching.is_terminal());
        assert!(!CheckoutState::Cleaning.is_terminal());
        assert!(CheckoutState::Done.is_terminal());
        assert!(CheckoutState::Aborted.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(CheckoutState::Transferring.to_string(), "Transferring");
        assert_eq!(CheckoutState::Aborted.to_string(), "Aborted");
    }
}
