pub mod config;
pub mod message;
pub mod metrics;
pub mod model;

pub use config::{BrokerConfig, ServiceConfig};
pub use message::{OrderData, OrderRequest, OrderResult, ResponseEnvelope};
pub use metrics::{MetricStatus, MetricsLog, RequestId};
pub use model::{NewOrder, NewProduct, Order, OrderStatus, Product};
