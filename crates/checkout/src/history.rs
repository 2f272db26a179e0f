//! Transition history of a checkout attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{CheckoutEvent, CheckoutState};

/// One accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: CheckoutState,
    pub event: CheckoutEvent,
    pub to: CheckoutState,
    pub at: DateTime<Utc>,
}

impl TransitionRecord {
    /// Records a transition happening now.
    pub fn now(from: CheckoutState, event: CheckoutEvent, to: CheckoutState) -> Self {
        Self {
            from,
            event,
            to,
            at: Utc::now(),
        }
    }
}

/// Returns the sequence of states visited, starting with the first `from`.
pub fn visited_states(records: &[TransitionRecord]) -> Vec<CheckoutState> {
    records
        .first()
        .map(|first| first.from)
        .into_iter()
        .chain(records.iter().map(|r| r.to))
        .collect()
}
