use lapin::{Connection, ConnectionProperties};
use tracing::{info, warn};

use ordex_core::config::BrokerConfig;

use crate::error::BrokerError;

/// Acquires broker connections with bounded retry.
///
/// One `acquire()` call makes up to `max_attempts` connection attempts,
/// sleeping `retry_delay` between failures. Exhaustion is reported as
/// [`BrokerError::Connect`]; deciding whether that is fatal belongs to the
/// caller (the consumer loop retries forever, the publisher gives up).
#[derive(Clone)]
pub struct BrokerConnector {
    config: BrokerConfig,
}

impl BrokerConnector {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    pub async fn acquire(&self) -> Result<Connection, BrokerError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Connection::connect(&self.config.url, connection_properties()).await {
                Ok(connection) => {
                    info!(attempt, "connected to broker");
                    return Ok(connection);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "broker connection attempt failed"
                    );
                    if attempt >= max_attempts {
                        return Err(BrokerError::Connect {
                            attempts: max_attempts,
                            last: err,
                        });
                    }
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }
}

fn connection_properties() -> ConnectionProperties {
    ConnectionProperties::default()
        .with_executor(tokio_executor_trait::Tokio::current())
        .with_reactor(tokio_reactor_trait::Tokio)
}
