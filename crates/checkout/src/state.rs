//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of one checkout attempt.
///
/// State transitions:
/// ```text
/// Pending ──┬──► OrderPlaced ──┬──► Completed
///           │                  └──► ClearFailed
///           └──► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Inputs validated, order not yet placed.
    #[default]
    Pending,

    /// The order service accepted the order; the cart is not yet cleared.
    OrderPlaced,

    /// Order placed and cart cleared (terminal state).
    Completed,

    /// The order was not created (terminal state).
    Rejected,

    /// Order placed but the cart clear failed. Recoverable by retrying the clear.
    ClearFailed,
}

impl CheckoutState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Pending, OrderPlaced)
                | (Pending, Rejected)
                | (OrderPlaced, Completed)
                | (OrderPlaced, ClearFailed)
                | (ClearFailed, Completed)
        )
    }

    /// Returns true if the remote order exists in this state.
    pub fn order_created(&self) -> bool {
        matches!(
            self,
            CheckoutState::OrderPlaced | CheckoutState::Completed | CheckoutState::ClearFailed
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Completed | CheckoutState::Rejected)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Pending => "pending",
            CheckoutState::OrderPlaced => "order_placed",
            CheckoutState::Completed => "completed",
            CheckoutState::Rejected => "rejected",
            CheckoutState::ClearFailed => "clear_failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
