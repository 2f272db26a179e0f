//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout.
///
/// State transitions:
/// ```text
/// Idle ──► Validating ──► AwaitingGatewayIntent ──► AwaitingUserPayment ──► VerifyingPayment ──► Completed
///              │                   │                        │                      │
///              ▼                   ▼                        ▼                      ▼
///       ValidationFailed  IntentCreationFailed      PaymentCancelled      VerificationFailed
/// ```
///
/// Every failure state and `Completed` return to `Idle` on `Reset`.
/// `Validating` and `AwaitingGatewayIntent` can also be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// No checkout in progress. The only state accepting a submission.
    #[default]
    Idle,

    /// Checking the address and cart.
    Validating,

    /// Waiting for the server to open a payment intent.
    AwaitingGatewayIntent,

    /// The shopper is in the gateway's payment step.
    AwaitingUserPayment,

    /// Waiting for the server to verify the payment and create the order.
    VerifyingPayment,

    /// The order exists.
    Completed,

    /// The address or cart was rejected. No network call was made.
    ValidationFailed,

    /// The server did not open a payment intent.
    IntentCreationFailed,

    /// The shopper left the payment step, or it timed out.
    PaymentCancelled,

    /// The server refused the payment proof. No order exists.
    VerificationFailed,
}

impl CheckoutState {
    /// Returns true if a new submission is accepted.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutState::Idle)
    }

    /// Returns true if a checkout is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            CheckoutState::Validating
                | CheckoutState::AwaitingGatewayIntent
                | CheckoutState::AwaitingUserPayment
                | CheckoutState::VerifyingPayment
        )
    }

    /// Returns true if this is a failure exit.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CheckoutState::ValidationFailed
                | CheckoutState::IntentCreationFailed
                | CheckoutState::PaymentCancelled
                | CheckoutState::VerificationFailed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::Validating => "Validating",
            CheckoutState::AwaitingGatewayIntent => "AwaitingGatewayIntent",
            CheckoutState::AwaitingUserPayment => "AwaitingUserPayment",
            CheckoutState::VerifyingPayment => "VerifyingPayment",
            CheckoutState::Completed => "Completed",
            CheckoutState::ValidationFailed => "ValidationFailed",
            CheckoutState::IntentCreationFailed => "IntentCreationFailed",
            CheckoutState::PaymentCancelled => "PaymentCancelled",
            CheckoutState::VerificationFailed => "VerificationFailed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that happened during a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckoutEvent {
    /// The shopper submitted the checkout form.
    Submit,
    /// Address and cart passed validation.
    Validated,
    /// Address or cart failed validation.
    ValidationRejected,
    /// The server opened a payment intent.
    IntentCreated,
    /// The server failed to open a payment intent.
    IntentFailed,
    /// The gateway reported a successful payment.
    PaymentSucceeded,
    /// The shopper cancelled, the gateway gave up, or the payment window expired.
    Cancel,
    /// The server verified the payment and created the order.
    Verified,
    /// The server refused the payment proof.
    VerificationRejected,
    /// Return to `Idle`.
    Reset,
}

impl CheckoutEvent {
    /// Returns the event name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutEvent::Submit => "Submit",
            CheckoutEvent::Validated => "Validated",
            CheckoutEvent::ValidationRejected => "ValidationRejected",
            CheckoutEvent::IntentCreated => "IntentCreated",
            CheckoutEvent::IntentFailed => "IntentFailed",
            CheckoutEvent::PaymentSucceeded => "PaymentSucceeded",
            CheckoutEvent::Cancel => "Cancel",
            CheckoutEvent::Verified => "Verified",
            CheckoutEvent::VerificationRejected => "VerificationRejected",
            CheckoutEvent::Reset => "Reset",
        }
    }
}

impl std::fmt::Display for CheckoutEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the state reached from `state` on `event`, or `None` if the
/// event is not accepted in that state.
pub fn transition(state: CheckoutState, event: CheckoutEvent) -> Option<CheckoutState> {
    use CheckoutEvent as E;
    use CheckoutState as S;

    match (state, event) {
        (S::Idle, E::Submit) => Some(S::Validating),
        (S::Idle, _) => None,

        (S::Validating, E::Validated) => Some(S::AwaitingGatewayIntent),
        (S::Validating, E::ValidationRejected) => Some(S::ValidationFailed),
        (S::Validating, E::Cancel) => Some(S::PaymentCancelled),
        (S::Validating, _) => None,

        (S::AwaitingGatewayIntent, E::IntentCreated) => Some(S::AwaitingUserPayment),
        (S::AwaitingGatewayIntent, E::IntentFailed) => Some(S::IntentCreationFailed),
        (S::AwaitingGatewayIntent, E::Cancel) => Some(S::PaymentCancelled),
        (S::AwaitingGatewayIntent, _) => None,

        (S::AwaitingUserPayment, E::PaymentSucceeded) => Some(S::VerifyingPayment),
        (S::AwaitingUserPayment, E::Cancel) => Some(S::PaymentCancelled),
        (S::AwaitingUserPayment, _) => None,

        (S::VerifyingPayment, E::Verified) => Some(S::Completed),
        (S::VerifyingPayment, E::VerificationRejected) => Some(S::VerificationFailed),
        (S::VerifyingPayment, _) => None,

        (
            S::Completed
            | S::ValidationFailed
            | S::IntentCreationFailed
            | S::PaymentCancelled
            | S::VerificationFailed,
            E::Reset,
        ) => Some(S::Idle),
        (
            S::Completed
            | S::ValidationFailed
            | S::IntentCreationFailed
            | S::PaymentCancelled
            | S::VerificationFailed,
            _,
        ) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [CheckoutState; 10] = [
        CheckoutState::Idle,
        CheckoutState::Validating,
        CheckoutState::AwaitingGatewayIntent,
        CheckoutState::AwaitingUserPayment,
        CheckoutState::VerifyingPayment,
        CheckoutState::Completed,
        CheckoutState::ValidationFailed,
        CheckoutState::IntentCreationFailed,
        CheckoutState::PaymentCancelled,
        CheckoutState::VerificationFailed,
    ];

    const ALL_EVENTS: [CheckoutEvent; 10] = [
        CheckoutEvent::Submit,
        CheckoutEvent::Validated,
        CheckoutEvent::ValidationRejected,
        CheckoutEvent::IntentCreated,
        CheckoutEvent::IntentFailed,
        CheckoutEvent::PaymentSucceeded,
        CheckoutEvent::Cancel,
        CheckoutEvent::Verified,
        CheckoutEvent::VerificationRejected,
        CheckoutEvent::Reset,
    ];

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(CheckoutState::default(), CheckoutState::Idle);
    }

    #[test]
    fn test_happy_path() {
        let mut state = CheckoutState::Idle;
        for event in [
            CheckoutEvent::Submit,
            CheckoutEvent::Validated,
            CheckoutEvent::IntentCreated,
            CheckoutEvent::PaymentSucceeded,
            CheckoutEvent::Verified,
        ] {
            state = transition(state, event).unwrap();
        }
        assert_eq!(state, CheckoutState::Completed);
        assert_eq!(
            transition(state, CheckoutEvent::Reset),
            Some(CheckoutState::Idle)
        );
    }

    #[test]
    fn test_only_idle_accepts_submit() {
        for state in ALL_STATES {
            assert_eq!(
                transition(state, CheckoutEvent::Submit).is_some(),
                state.can_submit(),
                "{state}"
            );
        }
    }

    #[test]
    fn test_every_failure_returns_to_idle() {
        for state in ALL_STATES.into_iter().filter(CheckoutState::is_failure) {
            assert_eq!(
                transition(state, CheckoutEvent::Reset),
                Some(CheckoutState::Idle)
            );
        }
    }

    #[test]
    fn test_cancel_before_proof_only() {
        for state in ALL_STATES {
            let cancelled = transition(state, CheckoutEvent::Cancel);
            let expected = matches!(
                state,
                CheckoutState::Validating
                    | CheckoutState::AwaitingGatewayIntent
                    | CheckoutState::AwaitingUserPayment
            );
            assert_eq!(cancelled.is_some(), expected, "{state}");
            if expected {
                assert_eq!(cancelled, Some(CheckoutState::PaymentCancelled));
            }
        }
    }

    #[test]
    fn test_verification_only_from_verifying() {
        for state in ALL_STATES {
            for event in [CheckoutEvent::Verified, CheckoutEvent::VerificationRejected] {
                assert_eq!(
                    transition(state, event).is_some(),
                    state == CheckoutState::VerifyingPayment
                );
            }
        }
    }

    #[test]
    fn test_in_flight_states_reject_reset() {
        for state in ALL_STATES.into_iter().filter(CheckoutState::is_in_flight) {
            assert_eq!(transition(state, CheckoutEvent::Reset), None);
        }
    }

    #[test]
    fn test_every_pair_is_defined() {
        let accepted = ALL_STATES
            .iter()
            .flat_map(|s| ALL_EVENTS.iter().map(move |e| transition(*s, *e)))
            .filter(Option::is_some)
            .count();
        assert_eq!(accepted, 16);
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckoutState::AwaitingUserPayment.to_string(), "AwaitingUserPayment");
        assert_eq!(CheckoutEvent::PaymentSucceeded.to_string(), "PaymentSucceeded");
    }

    #[test]
    fn test_serialization() {
        let state = CheckoutState::VerifyingPayment;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: CheckoutState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
