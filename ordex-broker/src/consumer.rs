use chrono::{Duration as ChronoDuration, Local, Utc};
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::ExchangeKind;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ordex_core::config::ServiceConfig;
use ordex_core::message::{OrderRequest, OrderResult, ResponseEnvelope};
use ordex_core::model::{NewOrder, Order, OrderStatus};
use ordex_store::OrderStore;

use crate::connection::BrokerConnector;
use crate::error::BrokerError;
use crate::publisher::ResponsePublisher;
use crate::REQUESTS_EXCHANGE;

/// Probability that a delivery's quantity is overridden by the
/// instance-keyed skew rule.
pub const OVERRIDE_PROBABILITY: f64 = 0.3;

/// Instance-keyed quantity skew: when the override fires, instance "2"
/// always reports 500 units and instance "3" always 300. Other instances
/// keep the looked-up quantity.
pub fn apply_override(fired: bool, instance: &str, quantity: i64) -> i64 {
    if !fired {
        return quantity;
    }
    match instance {
        "2" => 500,
        "3" => 300,
        _ => quantity,
    }
}

/// Synthesize the response payload for a processed request.
///
/// The synthetic order id combines the request id with the processing
/// instance, so a redelivered request processed twice produces two distinct
/// order ids referencing the same `request_id`.
pub fn synthesize_response(
    request: &OrderRequest,
    instance: &str,
    quantity: i64,
    in_stock: bool,
    processing_time: u64,
) -> ResponseEnvelope {
    let now = Local::now();
    ResponseEnvelope {
        request_id: request.request_id.clone(),
        microservice_id: instance.to_string(),
        response: OrderResult {
            order_id: format!("ORD-{}-{}", request.request_id, instance),
            customer_id: format!("CUST-{}", rand::thread_rng().gen_range(1000..10000)),
            product_id: request.data.product_id.clone(),
            order_status: if in_stock {
                OrderStatus::Confirmed
            } else {
                OrderStatus::Pending
            },
            total_items: quantity,
            order_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            estimated_delivery: (now + ChronoDuration::hours(24)).format("%Y-%m-%d").to_string(),
            instance: instance.to_string(),
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            status: OrderStatus::Processed,
            processing_time,
        },
    }
}

/// Serialized consumer of this instance's request queue.
///
/// Exactly one message is in flight at a time (prefetch 1); the store write
/// commits before the response is published, and the ack follows both. A
/// crash between commit and ack therefore redelivers the message — the
/// known duplicate-response window of this design.
pub struct RequestConsumer {
    connector: BrokerConnector,
    publisher: ResponsePublisher,
    store: OrderStore,
    config: ServiceConfig,
}

impl RequestConsumer {
    pub fn new(config: ServiceConfig, store: OrderStore) -> Self {
        Self {
            connector: BrokerConnector::new(config.broker.clone()),
            publisher: ResponsePublisher::new(config.broker.clone()),
            store,
            config,
        }
    }

    /// Supervised outer loop. Broker outages and mid-stream disconnects are
    /// logged and retried after `reconnect_delay`, forever; the loop only
    /// returns once `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(instance = %self.config.instance, "consumer stopping");
                    return;
                }
                result = self.consume() => match result {
                    Ok(()) => warn!("consumer stream ended; reconnecting"),
                    Err(err) => error!(error = %err, "consumer failed; reconnecting"),
                },
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(instance = %self.config.instance, "consumer stopping");
                    return;
                }
                _ = tokio::time::sleep(self.config.broker.reconnect_delay) => {}
            }
        }
    }

    /// One consume session: declare topology, then drain deliveries until
    /// the stream ends or a channel error surfaces.
    async fn consume(&self) -> Result<(), BrokerError> {
        let connection = self.connector.acquire().await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                REQUESTS_EXCHANGE,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        let queue = self.config.queue_name();
        channel
            .queue_declare(
                &queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                &queue,
                REQUESTS_EXCHANGE,
                &self.config.routing_key(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        // Strict per-instance serialization: one unacked delivery at a time.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let mut consumer = channel
            .basic_consume(
                &queue,
                &format!("ordex-{}", self.config.instance),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        info!(queue = %queue, instance = %self.config.instance, "consuming order requests");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;
            let redelivered = delivery.redelivered;
            match self.process(&delivery.data).await {
                Ok(()) => delivery.ack(BasicAckOptions::default()).await?,
                Err(err) => {
                    // No redelivery cap or dead-letter queue: a poison
                    // message loops here until it is drained externally.
                    error!(error = %err, redelivered, "processing failed; requeueing");
                    delivery
                        .nack(BasicNackOptions {
                            requeue: true,
                            ..BasicNackOptions::default()
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// received → processing → {processed, failed}
    async fn process(&self, body: &[u8]) -> Result<(), BrokerError> {
        let request: OrderRequest = serde_json::from_slice(body)?;
        debug!(request_id = %request.request_id, "request received");

        tokio::time::sleep(self.config.broker.processing_delay).await;

        let fired = rand::thread_rng().gen_bool(OVERRIDE_PROBABILITY);
        let (order, envelope) = self.execute(&request, fired).await?;

        self.publisher
            .publish(&request.response_routing_key, &envelope)
            .await;
        info!(
            request_id = %request.request_id,
            order_id = %order.order_id,
            quantity = order.quantity_ordered,
            "request processed"
        );
        Ok(())
    }

    /// Business rule for one request: product lookup, quantity override,
    /// order commit, response synthesis. The override decision is drawn by
    /// the caller so the rule itself stays deterministic.
    pub async fn execute(
        &self,
        request: &OrderRequest,
        override_fired: bool,
    ) -> Result<(Order, ResponseEnvelope), BrokerError> {
        let product = self.store.find_product(&request.data.product_id).await?;
        // Unknown product is not an error: quantity 0, out of stock.
        let (quantity, in_stock) = match &product {
            Some(p) => (p.quantity, p.in_stock),
            None => (0, false),
        };
        let quantity = apply_override(override_fired, &self.config.instance, quantity);

        let order = self
            .store
            .create_order(NewOrder {
                order_id: request.request_id.clone(),
                product_id: request.data.product_id.clone(),
                quantity_ordered: quantity,
                status: OrderStatus::Processed,
            })
            .await?;

        let envelope = synthesize_response(
            request,
            &self.config.instance,
            quantity,
            in_stock,
            self.config.broker.processing_delay.as_secs(),
        );
        Ok((order, envelope))
    }
}
