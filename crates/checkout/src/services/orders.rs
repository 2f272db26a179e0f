//! Order materialization service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{GatewayOrderId, OrderId, RemoteError};
use domain::{
    CheckoutDraft, Money, Order, PaymentIntent, ShippingQuote, TaxRate, VerifyPaymentRequest,
    price_lines, verify_payment_signature,
};

/// Trait for the server side of checkout.
///
/// Opening a payment intent never creates an order. Orders are created only
/// by `verify_and_create_order`, at most once per gateway order id, and only
/// for a draft matching the amount and currency of the paid intent.
#[async_trait]
pub trait OrderMaterializationService: Send + Sync {
    /// Returns the shipping charge for the current checkout.
    async fn shipping_quote(&self) -> Result<ShippingQuote, RemoteError>;

    /// Opens a gateway-side payment for the draft's total.
    async fn create_payment_intent(
        &self,
        draft: &CheckoutDraft,
    ) -> Result<PaymentIntent, RemoteError>;

    /// Verifies the payment proof and creates the order from the draft.
    async fn verify_and_create_order(
        &self,
        request: &VerifyPaymentRequest,
    ) -> Result<Order, RemoteError>;

    /// Looks up an order.
    async fn get_order(&self, order_id: OrderId) -> Result<Order, RemoteError>;
}

#[derive(Debug)]
struct InMemoryOrderState {
    shipping: Money,
    tax_rate: TaxRate,
    public_key: String,
    intents: HashMap<GatewayOrderId, PaymentIntent>,
    orders: HashMap<GatewayOrderId, Order>,
    quote_count: usize,
    intent_count: usize,
    verify_count: usize,
    fail_on_intent: bool,
    intent_delay: Option<Duration>,
}

/// In-memory order service for testing.
///
/// Checks the payment signature with the shared key secret before anything
/// else, then requires the draft to match the paid intent's amount and
/// currency and re-prices it before creating an order.
#[derive(Debug, Clone)]
pub struct InMemoryOrderService {
    key_secret: Arc<Vec<u8>>,
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a service verifying signatures with `key_secret` and quoting
    /// a flat shipping charge.
    pub fn new(key_secret: impl Into<Vec<u8>>, shipping: Money) -> Self {
        Self {
            key_secret: Arc::new(key_secret.into()),
            state: Arc::new(RwLock::new(InMemoryOrderState {
                shipping,
                tax_rate: TaxRate::DEFAULT,
                public_key: "key_test".to_string(),
                intents: HashMap::new(),
                orders: HashMap::new(),
                quote_count: 0,
                intent_count: 0,
                verify_count: 0,
                fail_on_intent: false,
                intent_delay: None,
            })),
        }
    }

    /// Sets the tax rate used to re-price drafts.
    pub fn with_tax_rate(self, tax_rate: TaxRate) -> Self {
        self.state.write().unwrap().tax_rate = tax_rate;
        self
    }

    /// Sets the publishable key returned with every intent.
    pub fn with_public_key(self, public_key: impl Into<String>) -> Self {
        self.state.write().unwrap().public_key = public_key.into();
        self
    }

    /// Returns the intent opened under `gateway_order_id`.
    pub fn intent(&self, gateway_order_id: &GatewayOrderId) -> Option<PaymentIntent> {
        self.state
            .read()
            .unwrap()
            .intents
            .get(gateway_order_id)
            .cloned()
    }

    /// Configures the service to fail intent creation.
    pub fn set_fail_on_intent(&self, fail: bool) {
        self.state.write().unwrap().fail_on_intent = fail;
    }

    /// Delays every intent creation by `delay`.
    pub fn set_intent_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().intent_delay = delay;
    }

    /// Returns the number of shipping quote calls.
    pub fn quote_count(&self) -> usize {
        self.state.read().unwrap().quote_count
    }

    /// Returns the number of intent creation calls.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intent_count
    }

    /// Returns the number of verify-and-create calls.
    pub fn verify_count(&self) -> usize {
        self.state.read().unwrap().verify_count
    }

    /// Returns the number of orders created.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }
}

#[async_trait]
impl OrderMaterializationService for InMemoryOrderService {
    async fn shipping_quote(&self) -> Result<ShippingQuote, RemoteError> {
        let mut state = self.state.write().unwrap();
        state.quote_count += 1;
        Ok(ShippingQuote::new(state.shipping))
    }

    async fn create_payment_intent(
        &self,
        draft: &CheckoutDraft,
    ) -> Result<PaymentIntent, RemoteError> {
        let delay = self.state.read().unwrap().intent_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.intent_count += 1;

        if state.fail_on_intent {
            return Err(RemoteError::Transient("gateway unavailable".to_string()));
        }

        let Some(amount) = draft.amount_minor_units() else {
            return Err(RemoteError::Rejected {
                status: 422,
                message: "amount out of range".to_string(),
            });
        };

        let n = state.intent_count;
        let intent = PaymentIntent {
            gateway_order_id: GatewayOrderId::new(format!("order_{n:06}")),
            amount,
            currency: draft.currency.clone(),
            receipt: format!("rcpt_{n:06}"),
            gateway_public_key: state.public_key.clone(),
        };
        state
            .intents
            .insert(intent.gateway_order_id.clone(), intent.clone());
        Ok(intent)
    }

    async fn verify_and_create_order(
        &self,
        request: &VerifyPaymentRequest,
    ) -> Result<Order, RemoteError> {
        let mut state = self.state.write().unwrap();
        state.verify_count += 1;

        let gateway_order_id = &request.proof.gateway_order_id;
        let Some(intent) = state.intents.get(gateway_order_id).cloned() else {
            return Err(RemoteError::Rejected {
                status: 404,
                message: format!("unknown gateway order {gateway_order_id}"),
            });
        };
        if !verify_payment_signature(&self.key_secret, &request.proof) {
            return Err(RemoteError::Rejected {
                status: 400,
                message: "invalid payment signature".to_string(),
            });
        }
        if let Some(order) = state.orders.get(gateway_order_id) {
            return Ok(order.clone());
        }

        let paid = request.draft.amount_minor_units();
        if paid != Some(intent.amount) || request.draft.currency != intent.currency {
            return Err(RemoteError::Rejected {
                status: 409,
                message: "draft does not match the paid intent".to_string(),
            });
        }

        let draft = &request.draft;
        let repriced = price_lines(
            &draft.lines,
            draft.pricing.discount,
            ShippingQuote::new(state.shipping),
            state.tax_rate,
        );
        if repriced.as_ref() != Ok(&draft.pricing) {
            return Err(RemoteError::Rejected {
                status: 409,
                message: "draft pricing does not match".to_string(),
            });
        }

        let order_number = format!("ORD-{:06}", state.orders.len() + 1);
        let order = Order::materialize(order_number, draft, &request.proof);
        state
            .orders
            .insert(gateway_order_id.clone(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order, RemoteError> {
        self.state
            .read()
            .unwrap()
            .orders
            .values()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected {
                status: 404,
                message: format!("order {order_id} not found"),
            })
    }
}
