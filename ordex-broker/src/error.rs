use ordex_store::StoreError;

/// Errors raised by the broker layer.
///
/// `Connect` is non-fatal at process level: the consumer's outer loop
/// retries it forever. Every other variant fails a single delivery, which
/// is then nacked with redelivery requested.
#[derive(Debug)]
pub enum BrokerError {
    /// The broker stayed unreachable through the bounded retry window.
    Connect { attempts: u32, last: lapin::Error },

    /// A channel operation (declare, bind, qos, consume, publish) failed.
    Amqp(lapin::Error),

    /// A message body did not match the typed wire schema.
    Decode(serde_json::Error),

    /// The store rejected the order write.
    Store(StoreError),
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Connect { attempts, last } => {
                write!(f, "Broker unreachable after {attempts} attempts: {last}")
            }
            BrokerError::Amqp(err) => write!(f, "AMQP error: {err}"),
            BrokerError::Decode(err) => write!(f, "Malformed message: {err}"),
            BrokerError::Store(err) => write!(f, "Store error: {err}"),
        }
    }
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrokerError::Connect { last, .. } => Some(last),
            BrokerError::Amqp(err) => Some(err),
            BrokerError::Decode(err) => Some(err),
            BrokerError::Store(err) => Some(err),
        }
    }
}

impl From<lapin::Error> for BrokerError {
    fn from(err: lapin::Error) -> Self {
        BrokerError::Amqp(err)
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        BrokerError::Decode(err)
    }
}

impl From<StoreError> for BrokerError {
    fn from(err: StoreError) -> Self {
        BrokerError::Store(err)
    }
}
