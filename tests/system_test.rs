use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use furui::config::{CoreConfig, DispatchConfig};
use furui::dispatcher::{DeliveryError, DeliveryHandler};
use furui::message::{DeliveryMode, Destination, Message, Payload};
use furui::system::System;

struct ChannelHandler {
    sender: mpsc::UnboundedSender<Arc<Message>>,
}

#[async_trait]
impl DeliveryHandler for ChannelHandler {
    async fn on_message(&self, message: Arc<Message>) -> Result<(), DeliveryError> {
        self.sender
            .send(message)
            .map_err(|e| DeliveryError::Unavailable(e.to_string()))
    }
}

struct CountingHandler {
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl DeliveryHandler for CountingHandler {
    async fn on_message(&self, _message: Arc<Message>) -> Result<(), DeliveryError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl DeliveryHandler for FailingHandler {
    async fn on_message(&self, _message: Arc<Message>) -> Result<(), DeliveryError> {
        Err(DeliveryError::Rejected("broken consumer".to_string()))
    }
}

fn channel_handler() -> (Arc<dyn DeliveryHandler>, mpsc::UnboundedReceiver<Arc<Message>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Arc::new(ChannelHandler { sender }), receiver)
}

/// A consumer subscribed with a selector receives exactly the messages the
/// selector matches.
#[tokio::test]
async fn test_selective_consumer_receives_matching_message() {
    let system = System::default();
    let destination = Destination::new("SessionStartTest");
    let (handler, mut receiver) = channel_handler();

    system
        .subscribe(
            "client-1",
            destination.clone(),
            Some("Cost = 2 AND JMSDeliveryMode = 2"),
            handler,
        )
        .unwrap();

    let message = Message::builder(destination.clone())
        .priority(1)
        .message_type("Special")
        .property("Cost", 2)
        .delivery_mode(DeliveryMode::NonPersistent)
        .text("Message")
        .build();

    let report = system.publish(message).await;
    assert_eq!(report.delivered, vec!["client-1"]);

    let received = receiver.recv().await.expect("did not get message");
    assert_eq!(received.payload(), &Payload::Text("Message".to_string()));
    assert_eq!(
        received.headers().message_type.as_deref(),
        Some("Special")
    );

    // a non-matching message is not delivered
    let report = system
        .publish(
            Message::builder(destination)
                .property("Cost", 5)
                .delivery_mode(DeliveryMode::NonPersistent)
                .build(),
        )
        .await;
    assert_eq!(report.delivered_count(), 0);
    assert!(receiver.try_recv().is_err());
}

/// A consumer subscribed without a selector receives everything.
#[tokio::test]
async fn test_unconditional_consumer_receives_everything() {
    let system = System::default();
    let destination = Destination::new("SessionStartTest");
    let count = Arc::new(AtomicUsize::new(0));

    system
        .subscribe(
            "client-1",
            destination.clone(),
            None,
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        )
        .unwrap();

    for i in 0..5 {
        system
            .publish(
                Message::builder(destination.clone())
                    .property("Cost", i)
                    .build(),
            )
            .await;
    }

    assert_eq!(count.load(Ordering::SeqCst), 5);
}

/// Topic-style fan-out: every matching consumer of the destination gets its
/// own delivery of the same message.
#[tokio::test]
async fn test_fan_out_to_multiple_matching_consumers() {
    let system = System::new(&CoreConfig {
        registry_capacity: 8,
        dispatch: DispatchConfig { max_concurrency: 2 },
    });
    let destination = Destination::new("broadcast");

    let (first, mut first_rx) = channel_handler();
    let (second, mut second_rx) = channel_handler();
    let (other, mut other_rx) = channel_handler();

    system
        .subscribe("first", destination.clone(), Some("Cost > 0"), first)
        .unwrap();
    system
        .subscribe("second", destination.clone(), Some("Cost > 1"), second)
        .unwrap();
    system
        .subscribe("other", destination.clone(), Some("Cost > 100"), other)
        .unwrap();

    let report = system
        .publish(
            Message::builder(destination)
                .property("Cost", 2)
                .build(),
        )
        .await;

    let mut delivered = report.delivered.clone();
    delivered.sort();
    assert_eq!(delivered, vec!["first", "second"]);
    assert!(first_rx.recv().await.is_some());
    assert!(second_rx.recv().await.is_some());
    assert!(other_rx.try_recv().is_err());
}

/// One consumer failing must not prevent delivery to the others, and the
/// failure shows up in the report.
#[tokio::test]
async fn test_failing_consumer_is_isolated() {
    let system = System::default();
    let destination = Destination::new("orders");
    let count = Arc::new(AtomicUsize::new(0));

    system
        .subscribe("bad", destination.clone(), None, Arc::new(FailingHandler))
        .unwrap();
    system
        .subscribe(
            "good",
            destination.clone(),
            None,
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        )
        .unwrap();

    let report = system
        .publish(Message::builder(destination).build())
        .await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(report.delivered, vec!["good"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].consumer_id, "bad");
    assert!(!report.is_complete());
}

/// Unsubscribing stops delivery for messages published afterwards.
#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let system = System::default();
    let destination = Destination::new("orders");
    let count = Arc::new(AtomicUsize::new(0));

    let handle = system
        .subscribe(
            "c1",
            destination.clone(),
            Some("Cost = 2"),
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        )
        .unwrap();

    let message = || {
        Message::builder(destination.clone())
            .property("Cost", 2)
            .build()
    };

    system.publish(message()).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    system.unsubscribe(&handle).unwrap();
    system.publish(message()).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// The report's delivered set equals the routed set minus handler failures.
#[tokio::test]
async fn test_report_reflects_routing_and_failures() {
    let system = System::default();
    let destination = Destination::new("orders");

    system
        .subscribe("no-match", destination.clone(), Some("Cost = 99"), Arc::new(FailingHandler))
        .unwrap();
    system
        .subscribe("fails", destination.clone(), Some("Cost = 2"), Arc::new(FailingHandler))
        .unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    system
        .subscribe(
            "works",
            destination.clone(),
            Some("Cost = 2"),
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        )
        .unwrap();

    let report = system
        .publish(
            Message::builder(destination)
                .property("Cost", 2)
                .build(),
        )
        .await;

    assert_eq!(report.delivered, vec!["works"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].consumer_id, "fails");
}
