//! Server cart client.

use async_trait::async_trait;
use cart::RemoteCartService;
use common::{AuthToken, RemoteError};
use domain::{Cart, CartLineItem, LineIdentity};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, parse_response};
use crate::wire::{RemoveItemBody, UpdateQuantityBody};

const CART_PATH: &str = "/api/cart";
const ITEMS_PATH: &str = "/api/cart/items";
const REMOVE_PATH: &str = "/api/cart/items/remove";

/// Typed HTTP client for the signed-in shopper's server cart.
///
/// Every call carries the shopper's bearer token; a 401 surfaces as
/// [`RemoteError::AuthRequired`].
#[derive(Debug, Clone)]
pub struct RemoteCartClient {
    http: Client,
    base_url: Url,
}

impl RemoteCartClient {
    /// Creates a client from a configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: &AuthToken,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(method, url).bearer_auth(token.expose()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Cart, ClientError> {
        let resp = request.send().await?;
        parse_response(resp).await
    }
}

#[async_trait]
impl RemoteCartService for RemoteCartClient {
    #[tracing::instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Cart, RemoteError> {
        let request = self.request(Method::GET, CART_PATH, token)?;
        Ok(self.send(request).await?)
    }

    #[tracing::instrument(skip(self, token, item), fields(identity = %item.identity()))]
    async fn add_item(&self, token: &AuthToken, item: &CartLineItem) -> Result<Cart, RemoteError> {
        let request = self.request(Method::POST, ITEMS_PATH, token)?.json(item);
        Ok(self.send(request).await?)
    }

    #[tracing::instrument(skip(self, token))]
    async fn update_quantity(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
        quantity: u32,
    ) -> Result<Cart, RemoteError> {
        let body = UpdateQuantityBody {
            identity: identity.clone(),
            quantity,
        };
        let request = self.request(Method::PATCH, ITEMS_PATH, token)?.json(&body);
        Ok(self.send(request).await?)
    }

    #[tracing::instrument(skip(self, token))]
    async fn remove_item(
        &self,
        token: &AuthToken,
        identity: &LineIdentity,
    ) -> Result<Cart, RemoteError> {
        let body = RemoveItemBody {
            identity: identity.clone(),
        };
        let request = self.request(Method::POST, REMOVE_PATH, token)?.json(&body);
        Ok(self.send(request).await?)
    }

    #[tracing::instrument(skip(self, token))]
    async fn clear(&self, token: &AuthToken) -> Result<Cart, RemoteError> {
        let request = self.request(Method::DELETE, CART_PATH, token)?;
        Ok(self.send(request).await?)
    }
}
