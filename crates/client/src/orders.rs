//! Order materialization client.

use std::sync::Arc;

use async_trait::async_trait;
use cart::AuthProvider;
use checkout::OrderMaterializationService;
use common::{OrderId, RemoteError};
use domain::{CheckoutDraft, Order, PaymentIntent, ShippingQuote, VerifyPaymentRequest};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, parse_response};
use crate::wire::OrderEnvelope;

/// Typed HTTP client for the checkout endpoints.
///
/// When an [`AuthProvider`] is attached, its token is sent with every call
/// so the server can clear the paying shopper's cart after verification.
#[derive(Clone)]
pub struct OrderClient {
    http: Client,
    base_url: Url,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl std::fmt::Debug for OrderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.auth.is_some())
            .finish()
    }
}

impl OrderClient {
    /// Creates a client from a configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.base_url.clone(),
            auth: None,
        })
    }

    /// Sends the provider's token, when present, with every call.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        let request = self.http.request(method, url);
        Ok(match self.auth.as_ref().and_then(|a| a.token()) {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        })
    }
}

#[async_trait]
impl OrderMaterializationService for OrderClient {
    #[tracing::instrument(skip(self))]
    async fn shipping_quote(&self) -> Result<ShippingQuote, RemoteError> {
        let resp = self
            .request(Method::GET, "/api/checkout/shipping-quote")?
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(parse_response(resp).await?)
    }

    #[tracing::instrument(skip(self, draft), fields(total = %draft.pricing.total))]
    async fn create_payment_intent(
        &self,
        draft: &CheckoutDraft,
    ) -> Result<PaymentIntent, RemoteError> {
        let resp = self
            .request(Method::POST, "/api/payments/intents")?
            .json(draft)
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(parse_response(resp).await?)
    }

    #[tracing::instrument(skip(self, request), fields(gateway_order_id = %request.proof.gateway_order_id))]
    async fn verify_and_create_order(
        &self,
        request: &VerifyPaymentRequest,
    ) -> Result<Order, RemoteError> {
        let resp = self
            .request(Method::POST, "/api/payments/verify")?
            .json(request)
            .send()
            .await
            .map_err(ClientError::from)?;
        let envelope: OrderEnvelope = parse_response(resp).await?;
        Ok(envelope.order)
    }

    #[tracing::instrument(skip(self))]
    async fn get_order(&self, order_id: OrderId) -> Result<Order, RemoteError> {
        let resp = self
            .request(Method::GET, &format!("/api/orders/{order_id}"))?
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(parse_response(resp).await?)
    }
}
