//! # System Facade
//!
//! Wires the registry, router and dispatcher behind the three calls a
//! surrounding broker makes: subscribe, unsubscribe, publish. The facade
//! adds no policy of its own — destination exclusivity, redelivery and
//! dead-lettering stay with the caller.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::dispatcher::{DeliveryDispatcher, DeliveryHandler, DispatchReport};
use crate::message::{Destination, Message};
use crate::registry::{BindingHandle, ConsumerId, RegistryError, SelectorRegistry};
use crate::router::Router;

pub struct System {
    registry: Arc<SelectorRegistry>,
    router: Router,
    dispatcher: DeliveryDispatcher,
}

impl System {
    pub fn new(config: &CoreConfig) -> Self {
        let registry = Arc::new(SelectorRegistry::with_capacity(config.registry_capacity));
        let router = Router::new(registry.clone());
        let dispatcher = DeliveryDispatcher::new(config.dispatch.clone());
        Self {
            registry,
            router,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<SelectorRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registers a consumer. A `None` selector subscribes unconditionally;
    /// selector compile errors fail the call and leave no binding behind.
    pub fn subscribe(
        &self,
        consumer_id: impl Into<ConsumerId> + std::fmt::Debug,
        destination: Destination,
        selector: Option<&str>,
        handler: Arc<dyn DeliveryHandler>,
    ) -> Result<BindingHandle, RegistryError> {
        self.registry.bind(consumer_id, destination, selector, handler)
    }

    pub fn unsubscribe(&self, handle: &BindingHandle) -> Result<(), RegistryError> {
        self.registry.unbind(handle)
    }

    /// Routes the message and dispatches it to every matching consumer.
    /// Zero matches is not an error: the report is simply empty.
    #[tracing::instrument(level = "debug", skip(self, message), fields(destination = %message.destination()))]
    pub async fn publish(&self, message: Message) -> DispatchReport {
        let message = Arc::new(message);
        let bindings = self.router.matching_bindings(&message);
        if bindings.is_empty() {
            tracing::debug!("no matching consumers for message");
            return DispatchReport::default();
        }
        self.dispatcher.dispatch(message, &bindings).await
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}
