//! Sandbox payment gateway client.

use async_trait::async_trait;
use checkout::{PaymentGateway, PaymentOutcome};
use common::RemoteError;
use domain::{PaymentIntent, PaymentProof};
use reqwest::Client;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, parse_response};

/// Pays intents through the storefront server's sandbox endpoint.
///
/// Stands in for the gateway widget in development: the sandbox signs the
/// payment with the gateway secret and returns the proof the widget's
/// success callback would deliver.
#[derive(Debug, Clone)]
pub struct SandboxGateway {
    http: Client,
    base_url: Url,
}

impl SandboxGateway {
    /// Creates a gateway client from a configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    #[tracing::instrument(skip(self, intent), fields(gateway_order_id = %intent.gateway_order_id))]
    async fn collect_payment(&self, intent: &PaymentIntent) -> Result<PaymentOutcome, RemoteError> {
        let url = self
            .base_url
            .join(&format!("/sandbox/pay/{}", intent.gateway_order_id))
            .map_err(ClientError::from)?;
        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(ClientError::from)?;
        let proof: PaymentProof = parse_response(resp).await?;
        Ok(PaymentOutcome::Succeeded(proof))
    }
}
