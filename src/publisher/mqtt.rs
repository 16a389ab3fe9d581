//! MQTT 3.1.1 telemetry sink

use super::{PublishOptions, TelemetrySink};
use crate::{
    defaults::DEFAULT_MQTT_KEEP_ALIVE,
    error::{AppError, Result},
    models::Config,
};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

/// Publishes each message over its own short-lived broker connection
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    timeout: Duration,
}

impl MqttPublisher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
            keep_alive: DEFAULT_MQTT_KEEP_ALIVE,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
        }
    }

    /// Broker settings from the configuration; credentials only when both are set
    pub fn from_config(config: &Config) -> Self {
        let mut publisher =
            Self::new(config.mqtt_server.clone(), config.mqtt_port).with_timeout(config.timeout());
        if let Some((user, pass)) = config.mqtt_credentials() {
            publisher = publisher.with_credentials(user, pass);
        }
        publisher
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn qos(level: u8) -> Result<QoS> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(AppError::invalid_input(format!("Unsupported QoS level {}", other))),
        }
    }

    /// Connection options for one publish.
    ///
    /// rumqttc rejects an empty client id, so each connection gets a random one.
    fn mqtt_options(&self) -> MqttOptions {
        let client_id = format!("{}-{}", crate::PKG_NAME, Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some((user, pass)) = &self.credentials {
            options.set_credentials(user.clone(), pass.clone());
        }
        options
    }
}

#[async_trait]
impl TelemetrySink for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str, options: PublishOptions) -> Result<()> {
        let qos = Self::qos(options.qos)?;
        let (client, mut eventloop) = AsyncClient::new(self.mqtt_options(), 4);

        // Queued until the event loop connects
        client
            .publish(topic, qos, options.retain, payload.as_bytes().to_vec())
            .await?;
        client.disconnect().await?;

        let drive = async {
            loop {
                if let Event::Outgoing(Outgoing::Disconnect) = eventloop.poll().await? {
                    break;
                }
            }
            Ok::<(), AppError>(())
        };

        timeout(self.timeout, drive).await.map_err(|_| {
            AppError::publish(format!(
                "Publishing to {}:{} timed out after {}s",
                self.host,
                self.port,
                self.timeout.as_secs()
            ))
        })?
    }
}
