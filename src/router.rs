//! # Router
//!
//! Computes the delivery set for one message: every binding of the message's
//! destination whose selector evaluates to `True`. A binding without a
//! selector always matches. A per-consumer evaluation failure (a type
//! mismatch inside that consumer's selector) excludes only that consumer —
//! it is logged and routing continues for the rest, so one bad pairing of
//! selector and message never disturbs the other consumers.

use std::sync::Arc;

use crate::eval::Truth;
use crate::message::Message;
use crate::registry::{ConsumerBinding, ConsumerId, SelectorRegistry};

pub struct Router {
    registry: Arc<SelectorRegistry>,
}

impl Router {
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self { registry }
    }

    /// The delivery set as consumer identities, in bind order.
    #[tracing::instrument(level = "debug", skip(self, message), fields(destination = %message.destination()))]
    pub fn route(&self, message: &Message) -> Vec<ConsumerId> {
        self.matching_bindings(message)
            .iter()
            .map(|binding| binding.consumer_id().to_string())
            .collect()
    }

    /// The delivery set as bindings, ready to hand to the dispatcher.
    pub fn matching_bindings(&self, message: &Message) -> Vec<Arc<ConsumerBinding>> {
        let bindings = self.registry.bindings_for(message.destination());
        let mut matched = Vec::new();

        for binding in bindings.iter() {
            match binding.selector().evaluate(message) {
                Ok(Truth::True) => matched.push(Arc::clone(binding)),
                Ok(result) => {
                    tracing::trace!(
                        consumer_id = %binding.consumer_id(),
                        result = %result,
                        "selector did not match"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        consumer_id = %binding.consumer_id(),
                        destination = %binding.destination(),
                        message_id = %message.headers().message_id,
                        error = %error,
                        "selector evaluation failed; consumer excluded for this message"
                    );
                }
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::dispatcher::{DeliveryError, DeliveryHandler};
    use crate::message::Destination;

    struct NoopHandler;

    #[async_trait]
    impl DeliveryHandler for NoopHandler {
        async fn on_message(&self, _message: Arc<Message>) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn handler() -> Arc<dyn DeliveryHandler> {
        Arc::new(NoopHandler)
    }

    fn destination() -> Destination {
        Destination::new("orders")
    }

    fn setup() -> (Arc<SelectorRegistry>, Router) {
        let registry = Arc::new(SelectorRegistry::new());
        let router = Router::new(registry.clone());
        (registry, router)
    }

    #[test]
    fn test_route_returns_matching_subset() {
        let (registry, router) = setup();
        registry
            .bind("cheap", destination(), Some("Cost < 5"), handler())
            .unwrap();
        registry
            .bind("expensive", destination(), Some("Cost >= 5"), handler())
            .unwrap();
        registry
            .bind("all", destination(), None, handler())
            .unwrap();

        let message = Message::builder(destination()).property("Cost", 2).build();
        assert_eq!(router.route(&message), vec!["cheap", "all"]);

        let message = Message::builder(destination()).property("Cost", 9).build();
        assert_eq!(router.route(&message), vec!["expensive", "all"]);
    }

    #[test]
    fn test_route_is_independent_of_bind_order() {
        let message = Message::builder(destination()).property("Cost", 2).build();

        let (registry, router) = setup();
        registry
            .bind("a", destination(), Some("Cost = 2"), handler())
            .unwrap();
        registry
            .bind("b", destination(), Some("Cost = 3"), handler())
            .unwrap();
        let mut first = router.route(&message);
        first.sort();

        let (registry, router) = setup();
        registry
            .bind("b", destination(), Some("Cost = 3"), handler())
            .unwrap();
        registry
            .bind("a", destination(), Some("Cost = 2"), handler())
            .unwrap();
        let mut second = router.route(&message);
        second.sort();

        assert_eq!(first, second);
        assert_eq!(first, vec!["a"]);
    }

    #[test]
    fn test_unknown_result_is_a_non_match() {
        let (registry, router) = setup();
        registry
            .bind("needs-cost", destination(), Some("Cost = 2"), handler())
            .unwrap();

        // message without the Cost property: unknown, not delivered
        let message = Message::builder(destination()).build();
        assert!(router.route(&message).is_empty());
    }

    #[test]
    fn test_evaluation_failure_excludes_only_that_consumer() {
        let (registry, router) = setup();
        registry
            .bind("broken", destination(), Some("Cost LIKE 'x%'"), handler())
            .unwrap();
        registry
            .bind("fine", destination(), Some("Cost = 2"), handler())
            .unwrap();

        // Cost is an integer, so the LIKE selector fails with a type
        // mismatch for this message; the other consumer still routes
        let message = Message::builder(destination()).property("Cost", 2).build();
        assert_eq!(router.route(&message), vec!["fine"]);
    }

    #[test]
    fn test_zero_bindings_is_empty_not_error() {
        let (_registry, router) = setup();
        let message = Message::builder(destination()).build();
        assert!(router.route(&message).is_empty());
    }

    #[test]
    fn test_unbind_is_visible_to_subsequent_routes() {
        let (registry, router) = setup();
        let handle = registry
            .bind("c1", destination(), None, handler())
            .unwrap();

        let message = Message::builder(destination()).build();
        assert_eq!(router.route(&message), vec!["c1"]);

        registry.unbind(&handle).unwrap();
        assert!(router.route(&message).is_empty());
    }
}
