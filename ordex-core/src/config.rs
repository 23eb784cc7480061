//! Service configuration built from environment variables.
//!
//! Every knob has a default matching the deployed topology, so a bare
//! `ServiceConfig::from_env()` yields a runnable instance "1". There is no
//! process-wide config singleton: the struct is constructed once in `main`
//! and handed to each component.

use std::path::PathBuf;
use std::time::Duration;

/// Retry discipline for the broker connection and the consumer's outer loop.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub url: String,
    /// Bounded attempts inside one `acquire()` call.
    pub max_attempts: u32,
    /// Delay between attempts inside one `acquire()` call.
    pub retry_delay: Duration,
    /// Delay before the outer consumer loop retries after any failure.
    pub reconnect_delay: Duration,
    /// Artificial per-message processing delay.
    pub processing_delay: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "amqp://rabbitmq:5672/%2f".into(),
            max_attempts: 5,
            retry_delay: Duration::from_secs(3),
            reconnect_delay: Duration::from_secs(5),
            processing_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Instance identity; selects the queue, routing key and listen port.
    pub instance: String,
    pub database_url: String,
    pub auth_url: String,
    pub certificate_url: String,
    /// Sibling instance base URLs queried by the history aggregator,
    /// in deterministic query order.
    pub siblings: Vec<String>,
    pub base_port: u16,
    /// Bound on every outbound HTTP call (auth, certificate, siblings).
    pub http_timeout: Duration,
    pub metrics_path: PathBuf,
    pub broker: BrokerConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let instance = env_or("INSTANCE_NUMBER", "1");
        let broker = BrokerConfig {
            url: env_or("AMQP_URL", "amqp://rabbitmq:5672/%2f"),
            max_attempts: env_parsed("BROKER_MAX_ATTEMPTS", 5),
            retry_delay: Duration::from_secs(env_parsed("BROKER_RETRY_DELAY_SECS", 3)),
            reconnect_delay: Duration::from_secs(env_parsed("BROKER_RECONNECT_DELAY_SECS", 5)),
            processing_delay: Duration::from_secs(env_parsed("PROCESSING_DELAY_SECS", 1)),
        };
        Self {
            database_url: env_or("DB_URL", &format!("sqlite://ordex{instance}.db?mode=rwc")),
            auth_url: env_or("AUTH_SERVICE_URL", "http://autorizador:5005"),
            certificate_url: env_or("CERTIFICATE_SERVICE_URL", "http://certificador:5006"),
            siblings: env_or(
                "SIBLING_URLS",
                "http://ordex1:5001,http://ordex2:5002,http://ordex3:5003",
            )
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
            base_port: env_parsed("BASE_PORT", 5000),
            http_timeout: Duration::from_secs(env_parsed("HTTP_TIMEOUT_SECS", 5)),
            metrics_path: PathBuf::from(env_or("METRICS_FILE", "metrics_log.csv")),
            instance,
            broker,
        }
    }

    /// Listen port: `base_port + instance`, matching the deployed convention
    /// (instance "1" on 5001 and so on). Non-numeric instances land on the
    /// base port.
    pub fn port(&self) -> u16 {
        self.base_port + self.instance.parse::<u16>().unwrap_or(0)
    }

    /// Queue owned by this instance on the `requests` exchange.
    pub fn queue_name(&self) -> String {
        format!("microservice_{}_queue", self.instance)
    }

    /// Routing key that binds this instance's queue.
    pub fn routing_key(&self) -> String {
        format!("microservice_{}", self.instance)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance: "1".into(),
            database_url: "sqlite://ordex1.db?mode=rwc".into(),
            auth_url: "http://autorizador:5005".into(),
            certificate_url: "http://certificador:5006".into(),
            siblings: vec![
                "http://ordex1:5001".into(),
                "http://ordex2:5002".into(),
                "http://ordex3:5003".into(),
            ],
            base_port: 5000,
            http_timeout: Duration::from_secs(5),
            metrics_path: PathBuf::from("metrics_log.csv"),
            broker: BrokerConfig::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
