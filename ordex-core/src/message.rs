//! Typed schemas for the broker wire format.
//!
//! Request messages arrive on the durable direct exchange `requests`, one
//! queue per instance; response messages are published persistently to the
//! `responses` exchange under the routing key the requester supplied.

use serde::{Deserialize, Serialize};

use crate::model::OrderStatus;

/// Payload of an order request as it travels on the broker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller-supplied correlation key; the eventual response carries it back.
    pub request_id: String,
    pub data: OrderData,
    /// Routing key on the `responses` exchange where the caller listens.
    pub response_routing_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderData {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Envelope published to the `responses` exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub request_id: String,
    /// Instance that processed the request.
    pub microservice_id: String,
    pub response: OrderResult,
}

/// Synthesized outcome of processing one order request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub order_status: OrderStatus,
    pub total_items: i64,
    /// `%Y-%m-%d %H:%M:%S`, local time of the processing instance.
    pub order_date: String,
    /// `%Y-%m-%d`, 24 hours after processing.
    pub estimated_delivery: String,
    pub instance: String,
    /// Unix timestamp (seconds) at synthesis time.
    pub timestamp: f64,
    pub status: OrderStatus,
    pub processing_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_quantity_is_optional() {
        let req: OrderRequest = serde_json::from_str(
            r#"{"request_id":"r1","data":{"product_id":"p1"},"response_routing_key":"rk1"}"#,
        )
        .unwrap();
        assert_eq!(req.request_id, "r1");
        assert_eq!(req.data.product_id, "p1");
        assert!(req.data.quantity.is_none());
    }

    #[test]
    fn envelope_round_trips_status_lowercase() {
        let envelope = ResponseEnvelope {
            request_id: "r1".into(),
            microservice_id: "2".into(),
            response: OrderResult {
                order_id: "ORD-r1-2".into(),
                customer_id: "CUST-1234".into(),
                product_id: "p1".into(),
                order_status: OrderStatus::Confirmed,
                total_items: 10,
                order_date: "2026-01-01 00:00:00".into(),
                estimated_delivery: "2026-01-02".into(),
                instance: "2".into(),
                timestamp: 0.0,
                status: OrderStatus::Processed,
                processing_time: 1,
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["response"]["order_status"], "confirmed");
        assert_eq!(json["response"]["status"], "processed");
        assert_eq!(json["request_id"], "r1");
    }
}
