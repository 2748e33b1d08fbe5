//! # Delivery Dispatcher
//!
//! Executes a delivery set: invokes each matched consumer's callback with
//! the message and collects the per-consumer outcomes. Delivery to one
//! consumer failing never prevents attempts to the remaining consumers; the
//! failure lands in the [`DispatchReport`] and a warning is logged.
//!
//! Whether the set holds one consumer (queue semantics) or many (topic
//! semantics) is decided by the caller — the dispatcher executes exactly the
//! set it is handed, with attempts started in binding order and bounded
//! concurrency.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::config::DispatchConfig;
use crate::message::Message;
use crate::registry::{ConsumerBinding, ConsumerId};

/// The consumer-side delivery callback, supplied by the surrounding broker.
///
/// The call returning `Ok` is the delivery acknowledgement; redelivery
/// policy on `Err` belongs to the caller.
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    async fn on_message(&self, message: Arc<Message>) -> Result<(), DeliveryError>;
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("message rejected by consumer: {0}")]
    Rejected(String),
    #[error("consumer unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of one dispatch call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Consumers whose callback returned `Ok`.
    pub delivered: Vec<ConsumerId>,
    /// Consumers whose callback returned an error.
    pub failed: Vec<DeliveryFailure>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }
}

#[derive(Debug)]
pub struct DeliveryFailure {
    pub consumer_id: ConsumerId,
    pub error: DeliveryError,
}

pub struct DeliveryDispatcher {
    config: DispatchConfig,
}

impl DeliveryDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Invokes every binding's handler with the message. At-least-once per
    /// binding per call: every handler is invoked exactly once here, and the
    /// caller may re-dispatch on failure.
    #[tracing::instrument(level = "debug", skip(self, message, bindings), fields(destination = %message.destination(), consumers = bindings.len()))]
    pub async fn dispatch(
        &self,
        message: Arc<Message>,
        bindings: &[Arc<ConsumerBinding>],
    ) -> DispatchReport {
        let concurrency = self.config.max_concurrency.max(1);

        let deliveries = bindings.iter().map(|binding| {
            let message = Arc::clone(&message);
            let binding = Arc::clone(binding);
            async move {
                let result = binding.handler().on_message(message).await;
                (binding, result)
            }
        });

        let outcomes: Vec<_> = stream::iter(deliveries)
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = DispatchReport::default();
        for (binding, result) in outcomes {
            match result {
                Ok(()) => report.delivered.push(binding.consumer_id().to_string()),
                Err(error) => {
                    tracing::warn!(
                        consumer_id = %binding.consumer_id(),
                        destination = %binding.destination(),
                        error = %error,
                        "delivery to consumer failed"
                    );
                    report.failed.push(DeliveryFailure {
                        consumer_id: binding.consumer_id().to_string(),
                        error,
                    });
                }
            }
        }
        report
    }
}
