//! Telemetry publishing
//!
//! A run ends with two messages: the primary topic carries the capture
//! time (or the JSON payload), and `<topic>/attributes` carries the four
//! measured values as JSON.

pub mod mqtt;

pub use mqtt::MqttPublisher;

use crate::{
    error::Result,
    logging::MeasurementLogger,
    models::{Config, RunResult},
    types::PrimaryPayload,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Delivery options for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// MQTT quality of service, 0..=2
    pub qos: u8,
    /// Whether the broker keeps the message for late subscribers
    pub retain: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self { qos: 0, retain: true }
    }
}

/// A topic and payload ready to publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub topic: String,
    pub payload: String,
    pub options: PublishOptions,
}

/// Destination for telemetry messages
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str, options: PublishOptions) -> Result<()>;
}

/// Turns a run result into telemetry messages and hands them to a sink
pub struct TelemetryPublisher {
    sink: Arc<dyn TelemetrySink>,
    topic: String,
    attributes_topic: String,
    primary_payload: PrimaryPayload,
    options: PublishOptions,
    logger: MeasurementLogger,
}

impl TelemetryPublisher {
    pub fn new(sink: Arc<dyn TelemetrySink>, config: &Config) -> Self {
        Self {
            sink,
            topic: config.mqtt_topic.clone(),
            attributes_topic: config.attributes_topic(),
            primary_payload: config.primary_payload,
            options: PublishOptions::default(),
            logger: MeasurementLogger::new(config),
        }
    }

    pub fn with_logger(mut self, logger: MeasurementLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Build the primary and attributes messages, in publish order
    pub fn messages(&self, result: &RunResult) -> Result<Vec<TelemetryMessage>> {
        let attributes = result.attributes_json()?;
        let primary = match self.primary_payload {
            PrimaryPayload::Timestamp => result.timestamp_string(),
            PrimaryPayload::Json => attributes.clone(),
        };

        Ok(vec![
            TelemetryMessage {
                topic: self.topic.clone(),
                payload: primary,
                options: self.options,
            },
            TelemetryMessage {
                topic: self.attributes_topic.clone(),
                payload: attributes,
                options: self.options,
            },
        ])
    }

    /// Publish both messages; the first failure aborts
    pub async fn publish(&self, result: &RunResult) -> Result<Vec<TelemetryMessage>> {
        let messages = self.messages(result)?;
        for message in &messages {
            self.logger.log_publish(&message.topic, &message.payload).await;
            self.sink
                .publish(&message.topic, &message.payload, message.options)
                .await?;
        }
        Ok(messages)
    }
}
