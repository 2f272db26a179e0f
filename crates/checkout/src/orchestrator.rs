//! Checkout orchestrator.

use std::time::Instant;

use cart::EngineError;
use common::OrderId;
use domain::{
    CheckoutDraft, Order, PricingBreakdown, ShippingAddress, ShippingQuote, VerifyPaymentRequest,
    price,
};
use tokio::sync::Mutex;

use crate::cancel::CancelHandle;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::history::TransitionRecord;
use crate::services::{CartHandle, OrderMaterializationService, PaymentGateway, PaymentOutcome};
use crate::state::{CheckoutEvent, CheckoutState, transition};

const CANCELLED_BY_SHOPPER: &str = "cancelled by shopper";
const PAYMENT_WINDOW_EXPIRED: &str = "payment window expired";

#[derive(Debug, Default)]
struct Session {
    state: CheckoutState,
    quote: Option<ShippingQuote>,
    draft: Option<CheckoutDraft>,
    history: Vec<TransitionRecord>,
    last_order: Option<Order>,
}

impl Session {
    fn apply(&mut self, event: CheckoutEvent) -> Result<CheckoutState> {
        let from = self.state;
        let to = transition(from, event).ok_or(CheckoutError::Busy { state: from })?;
        self.state = to;
        self.history.push(TransitionRecord::now(from, event, to));
        tracing::info!(%from, %event, %to, "checkout transition");
        Ok(to)
    }
}

/// Drives one checkout at a time from the shipping form to a created order.
///
/// ```text
/// submit ──► validate ──► create intent ──► collect payment ──► verify & create order ──► clear cart
/// ```
///
/// No order exists until the server verifies the gateway's payment proof.
/// Verification is sent exactly once per successful payment and never
/// retried. Every failure returns the orchestrator to `Idle`; a cancelled
/// payment keeps its draft for [`CheckoutOrchestrator::retry_payment`].
pub struct CheckoutOrchestrator<C, O, G>
where
    C: CartHandle,
    O: OrderMaterializationService,
    G: PaymentGateway,
{
    cart: C,
    orders: O,
    gateway: G,
    config: CheckoutConfig,
    session: Mutex<Session>,
    cancel: CancelHandle,
}

impl<C, O, G> CheckoutOrchestrator<C, O, G>
where
    C: CartHandle,
    O: OrderMaterializationService,
    G: PaymentGateway,
{
    /// Creates a new orchestrator in `Idle`.
    pub fn new(cart: C, orders: O, gateway: G, config: CheckoutConfig) -> Self {
        Self {
            cart,
            orders,
            gateway,
            config,
            session: Mutex::new(Session::default()),
            cancel: CancelHandle::default(),
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> CheckoutState {
        self.session.lock().await.state
    }

    /// Returns the transitions of the current or most recent attempt.
    pub async fn history(&self) -> Vec<TransitionRecord> {
        self.session.lock().await.history.clone()
    }

    /// Returns the draft kept for a retry, if any.
    pub async fn draft(&self) -> Option<CheckoutDraft> {
        self.session.lock().await.draft.clone()
    }

    /// Returns the order created by the last successful checkout.
    pub async fn last_order(&self) -> Option<Order> {
        self.session.lock().await.last_order.clone()
    }

    /// Returns a handle that cancels the running checkout.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Requests cancellation of the running checkout.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Starts a new checkout session and returns a pricing preview.
    ///
    /// Fetches the shipping quote once; `submit` reuses it. A completed
    /// checkout is reset to `Idle` first.
    #[tracing::instrument(skip(self))]
    pub async fn enter(&self) -> Result<PricingBreakdown> {
        {
            let mut session = self.session.lock().await;
            if session.state == CheckoutState::Completed {
                session.apply(CheckoutEvent::Reset)?;
            }
            if !session.state.can_submit() {
                return Err(CheckoutError::Busy {
                    state: session.state,
                });
            }
            session.quote = None;
            session.draft = None;
        }

        let quote = self.quote().await?;
        let cart = self.cart.current_cart().await?;
        let pricing = price(&cart, quote, self.config.tax_rate).map_err(EngineError::from)?;
        Ok(pricing)
    }

    /// Returns a completed checkout to `Idle`.
    pub async fn reset(&self) -> Result<CheckoutState> {
        self.session.lock().await.apply(CheckoutEvent::Reset)
    }

    /// Runs a checkout for the current cart.
    ///
    /// Only accepted in `Idle`; a submission while another checkout runs
    /// fails with [`CheckoutError::Busy`]. An invalid address is rejected
    /// before any network call.
    #[tracing::instrument(skip(self, address))]
    pub async fn submit(&self, address: ShippingAddress) -> Result<Order> {
        let started = self.begin().await?;

        if let Err(errors) = address.validate(&self.config.address_rules) {
            return Err(self
                .fail(CheckoutEvent::ValidationRejected, errors.into(), started)
                .await);
        }

        let cart = match self.cart.current_cart().await {
            Ok(cart) => cart,
            Err(e) => {
                return Err(self
                    .fail(CheckoutEvent::ValidationRejected, e.into(), started)
                    .await);
            }
        };
        let quote = match self.quote().await {
            Ok(quote) => quote,
            Err(e) => return Err(self.fail(CheckoutEvent::ValidationRejected, e, started).await),
        };

        let draft = match CheckoutDraft::prepare(
            &cart,
            address,
            &self.config.address_rules,
            quote,
            self.config.tax_rate,
            self.config.currency.clone(),
        ) {
            Ok(draft) => draft,
            Err(errors) => {
                return Err(self
                    .fail(CheckoutEvent::ValidationRejected, errors.into(), started)
                    .await);
            }
        };

        if self.cancel.is_cancelled() {
            return Err(self.cancelled(CANCELLED_BY_SHOPPER, started).await);
        }

        {
            let mut session = self.session.lock().await;
            session.apply(CheckoutEvent::Validated)?;
            session.draft = Some(draft.clone());
        }
        self.pay(draft, started).await
    }

    /// Retries the payment of a cancelled checkout with the same draft.
    #[tracing::instrument(skip(self))]
    pub async fn retry_payment(&self) -> Result<Order> {
        let draft = {
            let session = self.session.lock().await;
            if !session.state.can_submit() {
                return Err(CheckoutError::Busy {
                    state: session.state,
                });
            }
            session.draft.clone().ok_or(CheckoutError::NoDraft)?
        };

        let started = self.begin().await?;
        self.session
            .lock()
            .await
            .apply(CheckoutEvent::Validated)?;
        self.pay(draft, started).await
    }

    /// Looks up an order for the confirmation view.
    #[tracing::instrument(skip(self))]
    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await
            .map_err(CheckoutError::OrderLookup)
    }

    /// Moves `Idle` to `Validating` for a new attempt.
    async fn begin(&self) -> Result<Instant> {
        {
            let mut session = self.session.lock().await;
            if !session.state.can_submit() {
                return Err(CheckoutError::Busy {
                    state: session.state,
                });
            }
            session.history.clear();
            session.apply(CheckoutEvent::Submit)?;
        }
        self.cancel.reset();
        metrics::counter!("checkout_attempts_total").increment(1);
        Ok(Instant::now())
    }

    async fn quote(&self) -> Result<ShippingQuote> {
        if let Some(quote) = self.session.lock().await.quote {
            return Ok(quote);
        }
        let quote = self
            .orders
            .shipping_quote()
            .await
            .map_err(CheckoutError::ShippingQuote)?;
        self.session.lock().await.quote = Some(quote);
        Ok(quote)
    }

    /// Runs the steps from `AwaitingGatewayIntent` to the end.
    async fn pay(&self, draft: CheckoutDraft, started: Instant) -> Result<Order> {
        let intent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(self.cancelled(CANCELLED_BY_SHOPPER, started).await);
            }
            result = self.orders.create_payment_intent(&draft) => match result {
                Ok(intent) => intent,
                Err(e) => {
                    return Err(self
                        .fail(CheckoutEvent::IntentFailed, CheckoutError::IntentCreation(e), started)
                        .await);
                }
            },
        };
        self.session
            .lock()
            .await
            .apply(CheckoutEvent::IntentCreated)?;
        tracing::info!(
            gateway_order_id = %intent.gateway_order_id,
            amount = intent.amount,
            "payment intent created"
        );

        // A payment that is ready wins over a cancel or timeout ready on the
        // same poll: its proof must reach verification.
        let outcome = tokio::select! {
            biased;
            result = self.gateway.collect_payment(&intent) => {
                result.unwrap_or_else(|e| PaymentOutcome::Cancelled { reason: e.to_string() })
            }
            _ = self.cancel.cancelled() => PaymentOutcome::Cancelled {
                reason: CANCELLED_BY_SHOPPER.to_string(),
            },
            _ = tokio::time::sleep(self.config.payment_timeout) => PaymentOutcome::Cancelled {
                reason: PAYMENT_WINDOW_EXPIRED.to_string(),
            },
        };
        let proof = match outcome {
            PaymentOutcome::Succeeded(proof) => proof,
            PaymentOutcome::Cancelled { reason } => {
                return Err(self.cancelled(&reason, started).await);
            }
        };

        self.session
            .lock()
            .await
            .apply(CheckoutEvent::PaymentSucceeded)?;
        tracing::info!(payment_id = %proof.payment_id, "payment collected, verifying");

        let request = VerifyPaymentRequest { proof, draft };
        let order = match self.orders.verify_and_create_order(&request).await {
            Ok(order) => order,
            Err(e) => {
                self.session.lock().await.draft = None;
                return Err(self
                    .fail(
                        CheckoutEvent::VerificationRejected,
                        CheckoutError::Verification(e),
                        started,
                    )
                    .await);
            }
        };

        {
            let mut session = self.session.lock().await;
            session.apply(CheckoutEvent::Verified)?;
            session.draft = None;
            session.quote = None;
            session.last_order = Some(order.clone());
        }

        if let Err(e) = self.cart.clear_cart().await {
            tracing::warn!(order_id = %order.id, error = %e, "order created but cart was not cleared");
        }

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            duration,
            "checkout completed"
        );
        Ok(order)
    }

    async fn cancelled(&self, reason: &str, started: Instant) -> CheckoutError {
        self.fail(
            CheckoutEvent::Cancel,
            CheckoutError::PaymentCancelled {
                reason: reason.to_string(),
            },
            started,
        )
        .await
    }

    /// Records a failure exit, returns to `Idle` and hands back the error.
    async fn fail(&self, event: CheckoutEvent, error: CheckoutError, started: Instant) -> CheckoutError {
        {
            let mut session = self.session.lock().await;
            if let Err(e) = session
                .apply(event)
                .and_then(|_| session.apply(CheckoutEvent::Reset))
            {
                tracing::error!(error = %e, "checkout failure exit rejected");
            }
        }

        metrics::counter!("checkout_failed", "reason" => error.reason()).increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::warn!(error = %error, "checkout failed");
        error
    }
}
