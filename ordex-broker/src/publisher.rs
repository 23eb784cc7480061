use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, ExchangeKind};
use tracing::{debug, error};

use ordex_core::config::BrokerConfig;
use ordex_core::message::ResponseEnvelope;

use crate::connection::BrokerConnector;
use crate::error::BrokerError;
use crate::RESPONSES_EXCHANGE;

/// Publishes correlated responses to the shared `responses` exchange.
///
/// Each publish opens its own connection, declares the durable exchange and
/// sends the message persistently (delivery mode 2), addressed by the
/// routing key the original requester supplied. A failed publish is logged
/// and swallowed: the order commit it reports on is never rolled back, the
/// caller simply never learns the outcome.
#[derive(Clone)]
pub struct ResponsePublisher {
    connector: BrokerConnector,
}

impl ResponsePublisher {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            connector: BrokerConnector::new(config),
        }
    }

    pub async fn publish(&self, routing_key: &str, envelope: &ResponseEnvelope) {
        match self.try_publish(routing_key, envelope).await {
            Ok(()) => {
                debug!(
                    routing_key,
                    request_id = %envelope.request_id,
                    "response published"
                );
            }
            Err(err) => {
                error!(
                    routing_key,
                    request_id = %envelope.request_id,
                    error = %err,
                    "failed to publish response"
                );
            }
        }
    }

    async fn try_publish(
        &self,
        routing_key: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), BrokerError> {
        let connection = self.connector.acquire().await?;
        let channel = connection.create_channel().await?;
        channel
            .exchange_declare(
                RESPONSES_EXCHANGE,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        let body = serde_json::to_vec(envelope)?;
        channel
            .basic_publish(
                RESPONSES_EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if let Err(err) = connection.close(200, "response sent").await {
            debug!(error = %err, "broker connection close failed");
        }
        Ok(())
    }
}
