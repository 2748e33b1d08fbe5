//! # Selector Registry
//!
//! Consumer bindings per destination. Each binding carries its selector,
//! compiled exactly once when the consumer subscribes, so a broken selector
//! fails the subscribe call and never reaches routing.
//!
//! ## Concurrency
//!
//! Bindings are stored as copy-on-write snapshots: a `DashMap` from
//! destination to `Arc<Vec<Arc<ConsumerBinding>>>`. Binds and unbinds build
//! a new vector and swap the `Arc` while holding only that destination's
//! shard lock; routing reads clone the `Arc` and iterate without any lock.
//! A reader therefore never observes a partially-built binding, and an
//! unbind is invisible to every `bindings_for` call that starts after it
//! returns — snapshots already handed out finish against the old vector.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::dispatcher::DeliveryHandler;
use crate::message::Destination;
use crate::selector::{Selector, SelectorError};

/// Consumer identity, supplied by the surrounding broker.
pub type ConsumerId = String;

/// One consumer's subscription to one destination.
pub struct ConsumerBinding {
    id: Uuid,
    consumer_id: ConsumerId,
    destination: Destination,
    selector: Selector,
    handler: Arc<dyn DeliveryHandler>,
}

impl ConsumerBinding {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn handler(&self) -> &Arc<dyn DeliveryHandler> {
        &self.handler
    }
}

impl std::fmt::Debug for ConsumerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerBinding")
            .field("id", &self.id)
            .field("consumer_id", &self.consumer_id)
            .field("destination", &self.destination)
            .field("selector", &self.selector.text())
            .finish()
    }
}

/// Opaque handle returned by [`SelectorRegistry::bind`] and consumed by
/// [`SelectorRegistry::unbind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingHandle {
    id: Uuid,
    destination: Destination,
}

impl BindingHandle {
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

type BindingSnapshot = Arc<Vec<Arc<ConsumerBinding>>>;

/// The only mutable shared structure of the core.
#[derive(Default)]
pub struct SelectorRegistry {
    bindings: DashMap<Destination, BindingSnapshot>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bindings: DashMap::with_capacity(capacity),
        }
    }

    /// Registers a consumer for a destination. `selector_text` of `None`
    /// (or blank text) binds unconditionally; otherwise the selector is
    /// compiled here and compile errors propagate to the subscriber.
    #[tracing::instrument(level = "debug", skip(self, handler))]
    pub fn bind(
        &self,
        consumer_id: impl Into<ConsumerId> + std::fmt::Debug,
        destination: Destination,
        selector_text: Option<&str>,
        handler: Arc<dyn DeliveryHandler>,
    ) -> Result<BindingHandle, RegistryError> {
        let selector = match selector_text {
            Some(text) => Selector::compile(text)?,
            None => Selector::match_all(),
        };

        let binding = Arc::new(ConsumerBinding {
            id: Uuid::new_v4(),
            consumer_id: consumer_id.into(),
            destination: destination.clone(),
            selector,
            handler,
        });
        let handle = BindingHandle {
            id: binding.id,
            destination: destination.clone(),
        };

        let mut entry = self
            .bindings
            .entry(destination)
            .or_insert_with(|| Arc::new(Vec::new()));
        let mut next = Vec::with_capacity(entry.len() + 1);
        next.extend(entry.iter().cloned());
        next.push(binding);
        *entry.value_mut() = Arc::new(next);

        tracing::debug!(binding = ?handle, "consumer bound");
        Ok(handle)
    }

    /// Removes a binding. After this returns, routing that starts later
    /// cannot see the binding; in-flight snapshots may still finish.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn unbind(&self, handle: &BindingHandle) -> Result<(), RegistryError> {
        let mut entry = self
            .bindings
            .get_mut(&handle.destination)
            .ok_or_else(|| RegistryError::BindingNotFound { id: handle.id })?;

        if !entry.iter().any(|b| b.id == handle.id) {
            return Err(RegistryError::BindingNotFound { id: handle.id });
        }

        let next: Vec<_> = entry
            .iter()
            .filter(|b| b.id != handle.id)
            .cloned()
            .collect();
        *entry.value_mut() = Arc::new(next);

        tracing::debug!(binding = ?handle, "consumer unbound");
        Ok(())
    }

    /// Snapshot of the destination's bindings in bind order. The returned
    /// vector is immutable; concurrent binds and unbinds produce new
    /// snapshots without touching it.
    pub fn bindings_for(&self, destination: &Destination) -> BindingSnapshot {
        self.bindings
            .get(destination)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("selector rejected at bind time: {0}")]
    Selector(#[from] SelectorError),
    #[error("binding not found: {id}")]
    BindingNotFound { id: Uuid },
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::dispatcher::DeliveryError;
    use crate::message::Message;

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

    #[test]
    fn test_bind_preserves_order() {
        let registry = SelectorRegistry::new();
        registry
            .bind("c1", destination(), Some("Cost = 1"), handler())
            .unwrap();
        registry
            .bind("c2", destination(), None, handler())
            .unwrap();
        registry
            .bind("c3", destination(), Some("Cost = 3"), handler())
            .unwrap();

        let bindings = registry.bindings_for(&destination());
        let ids: Vec<_> = bindings.iter().map(|b| b.consumer_id()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(bindings[0].selector().text(), Some("Cost = 1"));
        assert_eq!(bindings[1].selector().text(), None);
    }

    #[test]
    fn test_bad_selector_produces_no_binding() {
        let registry = SelectorRegistry::new();
        let result = registry.bind("c1", destination(), Some("Cost = ("), handler());
        assert!(matches!(result, Err(RegistryError::Selector(_))));
        assert!(registry.bindings_for(&destination()).is_empty());
    }

    #[test]
    fn test_unbind_removes_only_target() {
        let registry = SelectorRegistry::new();
        let h1 = registry
            .bind("c1", destination(), None, handler())
            .unwrap();
        let _h2 = registry
            .bind("c2", destination(), None, handler())
            .unwrap();

        registry.unbind(&h1).unwrap();
        let bindings = registry.bindings_for(&destination());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].consumer_id(), "c2");

        // a second unbind of the same handle fails
        assert!(matches!(
            registry.unbind(&h1),
            Err(RegistryError::BindingNotFound { .. })
        ));
    }

    #[test]
    fn test_unbind_unknown_destination() {
        let registry = SelectorRegistry::new();
        let handle = registry
            .bind("c1", destination(), None, handler())
            .unwrap();
        registry.unbind(&handle).unwrap();

        let other = SelectorRegistry::new();
        assert!(matches!(
            other.unbind(&handle),
            Err(RegistryError::BindingNotFound { .. })
        ));
    }

    #[test]
    fn test_snapshots_are_isolated_from_unbind() {
        let registry = SelectorRegistry::new();
        let h1 = registry
            .bind("c1", destination(), None, handler())
            .unwrap();

        let snapshot = registry.bindings_for(&destination());
        registry.unbind(&h1).unwrap();

        // the old snapshot still sees the binding; a fresh one does not
        assert_eq!(snapshot.len(), 1);
        assert!(registry.bindings_for(&destination()).is_empty());
    }

    #[test]
    fn test_unknown_destination_is_empty_not_error() {
        let registry = SelectorRegistry::new();
        assert!(registry
            .bindings_for(&Destination::new("nowhere"))
            .is_empty());
    }
}
