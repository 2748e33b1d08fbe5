//! # Message Envelope
//!
//! The immutable message envelope the routing core operates on: a
//! destination, a fixed set of headers, a typed property bag and an opaque
//! payload. Messages are constructed through [`MessageBuilder`] and never
//! mutated afterwards, so an `Arc<Message>` can be handed to any number of
//! delivery tasks.
//!
//! Selector identifiers resolve against a message via the
//! [`EvaluationContext`] implementation at the bottom of this module:
//! the selectable header names are matched first and never fall through to
//! the property bag, so a property that happens to be called
//! `JMSDeliveryMode` cannot shadow the header.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::eval::context::EvaluationContext;

/// Header names that selectors may reference.
pub const HEADER_DELIVERY_MODE: &str = "JMSDeliveryMode";
pub const HEADER_PRIORITY: &str = "JMSPriority";
pub const HEADER_MESSAGE_ID: &str = "JMSMessageID";
pub const HEADER_TIMESTAMP: &str = "JMSTimestamp";
pub const HEADER_CORRELATION_ID: &str = "JMSCorrelationID";
pub const HEADER_TYPE: &str = "JMSType";

/// Header names that exist on the wire but are not selectable; referencing
/// one in a selector is rejected at compile time.
pub const UNSELECTABLE_HEADERS: [&str; 4] = [
    "JMSDestination",
    "JMSReplyTo",
    "JMSExpiration",
    "JMSRedelivered",
];

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// A named routing target. The core only needs identity (equality and
/// hashing); queue-vs-topic semantics stay with the surrounding broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(String);

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence hint carried in the delivery-mode header.
///
/// The numeric codes visible to selectors are NonPersistent = 2 and
/// Persistent = 1; `JMSDeliveryMode = 2` selects non-persistent messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    NonPersistent,
    #[default]
    Persistent,
}

impl DeliveryMode {
    pub fn selector_code(&self) -> i64 {
        match self {
            DeliveryMode::NonPersistent => 2,
            DeliveryMode::Persistent => 1,
        }
    }
}

/// The fixed header set of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeaders {
    pub message_id: String,
    pub correlation_id: Option<String>,
    /// Epoch milliseconds, stamped at build time unless supplied.
    pub timestamp: i64,
    pub delivery_mode: DeliveryMode,
    /// 0..=9, clamped by the builder; default 4.
    pub priority: u8,
    pub message_type: Option<String>,
}

/// Message payload, opaque to selection and routing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

/// An immutable message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    destination: Destination,
    headers: MessageHeaders,
    properties: HashMap<String, Value>,
    payload: Payload,
}

impl Message {
    pub fn builder(destination: Destination) -> MessageBuilder {
        MessageBuilder::new(destination)
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl EvaluationContext for Message {
    fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            HEADER_DELIVERY_MODE => Some(Value::Integer(self.headers.delivery_mode.selector_code())),
            HEADER_PRIORITY => Some(Value::Integer(self.headers.priority as i64)),
            HEADER_MESSAGE_ID => Some(Value::String(self.headers.message_id.clone())),
            HEADER_TIMESTAMP => Some(Value::Integer(self.headers.timestamp)),
            HEADER_CORRELATION_ID => self
                .headers
                .correlation_id
                .as_ref()
                .map(|id| Value::String(id.clone())),
            HEADER_TYPE => self
                .headers
                .message_type
                .as_ref()
                .map(|t| Value::String(t.clone())),
            _ => self.properties.get(name).cloned(),
        }
    }
}

/// Builder for [`Message`]. Unset headers get their defaults at `build`
/// time: a UUID message id, the current time, `Persistent`, priority 4.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    destination: Destination,
    message_id: Option<String>,
    correlation_id: Option<String>,
    timestamp: Option<i64>,
    delivery_mode: DeliveryMode,
    priority: u8,
    message_type: Option<String>,
    properties: HashMap<String, Value>,
    payload: Payload,
}

impl MessageBuilder {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            message_id: None,
            correlation_id: None,
            timestamp: None,
            delivery_mode: DeliveryMode::default(),
            priority: 4,
            message_type: None,
            properties: HashMap::new(),
            payload: Payload::Empty,
        }
    }

    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn timestamp(mut self, epoch_millis: i64) -> Self {
        self.timestamp = Some(epoch_millis);
        self
    }

    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(9);
        self
    }

    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.payload = Payload::Text(body.into());
        self
    }

    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.payload = Payload::Bytes(body);
        self
    }

    pub fn build(self) -> Message {
        let message_id = self
            .message_id
            .unwrap_or_else(|| format!("ID:{}", Uuid::new_v4()));
        let timestamp = self.timestamp.unwrap_or_else(now_millis);

        Message {
            destination: self.destination,
            headers: MessageHeaders {
                message_id,
                correlation_id: self.correlation_id,
                timestamp,
                delivery_mode: self.delivery_mode,
                priority: self.priority,
                message_type: self.message_type,
            },
            properties: self.properties,
            payload: self.payload,
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> Destination {
        Destination::new("test.queue")
    }

    #[test]
    fn test_builder_defaults() {
        let message = Message::builder(destination()).build();

        assert!(message.headers().message_id.starts_with("ID:"));
        assert!(message.headers().timestamp > 0);
        assert_eq!(message.headers().delivery_mode, DeliveryMode::Persistent);
        assert_eq!(message.headers().priority, 4);
        assert_eq!(message.headers().message_type, None);
        assert_eq!(message.payload(), &Payload::Empty);
    }

    #[test]
    fn test_priority_clamped() {
        let message = Message::builder(destination()).priority(42).build();
        assert_eq!(message.headers().priority, 9);
    }

    #[test]
    fn test_property_types() {
        let message = Message::builder(destination())
            .property("Cost", 2)
            .property("Weight", 1.5)
            .property("Country", "UK")
            .property("Active", true)
            .build();

        assert_eq!(message.property("Cost"), Some(&Value::Integer(2)));
        assert_eq!(message.property("Weight"), Some(&Value::Float(1.5)));
        assert_eq!(
            message.property("Country"),
            Some(&Value::String("UK".to_string()))
        );
        assert_eq!(message.property("Active"), Some(&Value::Boolean(true)));
        assert_eq!(message.property("Missing"), None);
    }

    #[test]
    fn test_lookup_headers() {
        let message = Message::builder(destination())
            .delivery_mode(DeliveryMode::NonPersistent)
            .priority(7)
            .message_type("Special")
            .build();

        assert_eq!(
            message.lookup(HEADER_DELIVERY_MODE),
            Some(Value::Integer(2))
        );
        assert_eq!(message.lookup(HEADER_PRIORITY), Some(Value::Integer(7)));
        assert_eq!(
            message.lookup(HEADER_TYPE),
            Some(Value::String("Special".to_string()))
        );
        // unset optional headers resolve to absent, not to a property
        assert_eq!(message.lookup(HEADER_CORRELATION_ID), None);
    }

    #[test]
    fn test_delivery_mode_codes() {
        assert_eq!(DeliveryMode::NonPersistent.selector_code(), 2);
        assert_eq!(DeliveryMode::Persistent.selector_code(), 1);
    }

    #[test]
    fn test_header_lookup_never_falls_through_to_properties() {
        let message = Message::builder(destination())
            .property("JMSType", "shadow")
            .build();

        // the header is unset, so lookup is absent even though a property
        // with the same name exists
        assert_eq!(message.lookup(HEADER_TYPE), None);
        // plain property access still sees it
        assert_eq!(
            message.property("JMSType"),
            Some(&Value::String("shadow".to_string()))
        );
    }
}
