pub mod connection;
pub mod consumer;
pub mod error;
pub mod publisher;

pub use connection::BrokerConnector;
pub use consumer::{apply_override, synthesize_response, RequestConsumer, OVERRIDE_PROBABILITY};
pub use error::BrokerError;
pub use publisher::ResponsePublisher;

/// Durable direct exchange carrying order requests.
pub const REQUESTS_EXCHANGE: &str = "requests";

/// Durable direct exchange carrying correlated responses.
pub const RESPONSES_EXCHANGE: &str = "responses";
