//! Order Status State Machine
//!
//! Legal transitions:
//!
//! ```text
//! PROCESSING      -> ON_HOLD | PENDING_PAYMENT | CANCELLED
//! ON_HOLD         -> PROCESSING | PENDING_PAYMENT | COMPLETED | CANCELLED
//! PENDING_PAYMENT -> PROCESSING | ON_HOLD | COMPLETED | CANCELLED
//! COMPLETED       -> REFUNDED
//! CANCELLED       -> ON_HOLD            (reactivation)
//! REFUNDED        -> (terminal)
//! ```
//!
//! Every non-cancelled status holds a stock reservation for the order's
//! items. Crossing the cancelled boundary therefore carries a side
//! effect: entering CANCELLED releases stock, leaving it re-reserves.

use shared::models::OrderStatus;

/// Allowed target statuses for a given current status
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Processing => &[OnHold, PendingPayment, Cancelled],
        OnHold => &[Processing, PendingPayment, Completed, Cancelled],
        PendingPayment => &[Processing, OnHold, Completed, Cancelled],
        Completed => &[Refunded],
        Cancelled => &[OnHold],
        Refunded => &[],
    }
}

/// Whether `from -> to` is a legal transition
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Fully terminal statuses (no transition leaves them)
pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Refunded)
}

/// Whether an order in this status holds stock reservations
pub fn holds_stock(status: OrderStatus) -> bool {
    !matches!(status, OrderStatus::Cancelled)
}

/// Inventory side effect of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// No stock movement
    None,
    /// Re-reserve stock for every item (leaving CANCELLED)
    Reserve,
    /// Release stock for every item (entering CANCELLED)
    Release,
}

/// Derive the inventory side effect of `from -> to`
pub fn transition_effect(from: OrderStatus, to: OrderStatus) -> TransitionEffect {
    match (holds_stock(from), holds_stock(to)) {
        (false, true) => TransitionEffect::Reserve,
        (true, false) => TransitionEffect::Release,
        _ => TransitionEffect::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_processing_transitions() {
        assert!(can_transition(Processing, OnHold));
        assert!(can_transition(Processing, PendingPayment));
        assert!(can_transition(Processing, Cancelled));
        assert!(!can_transition(Processing, Completed));
        assert!(!can_transition(Processing, Refunded));
    }

    #[test]
    fn test_completed_only_refundable() {
        assert!(can_transition(Completed, Refunded));
        assert!(!can_transition(Completed, Processing));
        assert!(!can_transition(Completed, Cancelled));
    }

    #[test]
    fn test_cancelled_reactivation_only() {
        assert!(can_transition(Cancelled, OnHold));
        assert!(!can_transition(Cancelled, Processing));
        assert!(!can_transition(Cancelled, Completed));
    }

    #[test]
    fn test_refunded_terminal() {
        assert!(is_terminal(Refunded));
        assert!(allowed_transitions(Refunded).is_empty());
        assert!(!is_terminal(Completed));
        assert!(!is_terminal(Cancelled));
    }

    #[test]
    fn test_holds_stock() {
        assert!(holds_stock(Processing));
        assert!(holds_stock(Completed));
        assert!(holds_stock(Refunded));
        assert!(!holds_stock(Cancelled));
    }

    #[test]
    fn test_transition_effects() {
        assert_eq!(transition_effect(Processing, Cancelled), TransitionEffect::Release);
        assert_eq!(transition_effect(OnHold, Cancelled), TransitionEffect::Release);
        assert_eq!(transition_effect(Cancelled, OnHold), TransitionEffect::Reserve);
        assert_eq!(transition_effect(Processing, OnHold), TransitionEffect::None);
        assert_eq!(transition_effect(OnHold, Completed), TransitionEffect::None);
    }
}
