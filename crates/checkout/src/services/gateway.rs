//! Payment gateway trait and scripted implementation.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{PaymentId, RemoteError};
use domain::{PaymentIntent, PaymentProof, sign_payment};

/// How the shopper's payment step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The gateway's success callback fired with this proof.
    Succeeded(PaymentProof),
    /// The shopper closed the payment step or the gateway gave up.
    Cancelled { reason: String },
}

/// The gateway's user-facing payment step.
///
/// `collect_payment` may take as long as the shopper needs; the orchestrator
/// bounds and cancels it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens the payment step for an intent and waits for it to end.
    async fn collect_payment(&self, intent: &PaymentIntent) -> Result<PaymentOutcome, RemoteError>;
}

/// What a [`ScriptedGateway`] does on its next collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStep {
    /// Pay and return a correctly signed proof.
    Pay,
    /// Pay after the shopper spent `Duration` in the payment step.
    PayAfter(Duration),
    /// Pay but return a proof with a bad signature.
    PayWithForgedSignature,
    /// The shopper closes the payment step.
    Cancel,
    /// The gateway widget fails.
    Fail,
    /// Never finish.
    Hang,
}

#[derive(Debug, Default)]
struct ScriptedGatewayState {
    steps: VecDeque<GatewayStep>,
    collect_count: usize,
}

/// Gateway fake that follows a script, paying by default.
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    key_secret: Arc<Vec<u8>>,
    state: Arc<RwLock<ScriptedGatewayState>>,
}

impl ScriptedGateway {
    /// Creates a gateway signing proofs with `key_secret`.
    pub fn new(key_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            key_secret: Arc::new(key_secret.into()),
            state: Arc::default(),
        }
    }

    /// Queues the behavior of the next collection.
    pub fn push(&self, step: GatewayStep) {
        self.state.write().unwrap().steps.push_back(step);
    }

    /// Returns the number of collections started.
    pub fn collect_count(&self) -> usize {
        self.state.read().unwrap().collect_count
    }

    fn proof(&self, intent: &PaymentIntent, n: usize) -> Result<PaymentProof, RemoteError> {
        let payment_id = PaymentId::new(format!("pay_{n:06}"));
        let signature = sign_payment(&self.key_secret, &intent.gateway_order_id, &payment_id)
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(PaymentProof {
            gateway_order_id: intent.gateway_order_id.clone(),
            payment_id,
            signature,
        })
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn collect_payment(&self, intent: &PaymentIntent) -> Result<PaymentOutcome, RemoteError> {
        let (step, n) = {
            let mut state = self.state.write().unwrap();
            state.collect_count += 1;
            let step = state.steps.pop_front().unwrap_or(GatewayStep::Pay);
            (step, state.collect_count)
        };

        match step {
            GatewayStep::Pay => Ok(PaymentOutcome::Succeeded(self.proof(intent, n)?)),
            GatewayStep::PayAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(PaymentOutcome::Succeeded(self.proof(intent, n)?))
            }
            GatewayStep::PayWithForgedSignature => {
                let mut proof = self.proof(intent, n)?;
                proof.signature = "00".repeat(32);
                Ok(PaymentOutcome::Succeeded(proof))
            }
            GatewayStep::Cancel => Ok(PaymentOutcome::Cancelled {
                reason: "payment window closed".to_string(),
            }),
            GatewayStep::Fail => Err(RemoteError::Transient("gateway widget crashed".to_string())),
            GatewayStep::Hang => std::future::pending().await,
        }
    }
}
