use axum::extract::FromRef;

use ordex_core::config::ServiceConfig;
use ordex_core::metrics::MetricsLog;
use ordex_store::OrderStore;

use crate::auth::AuthGateway;
use crate::certificate::CertificateClient;
use crate::history::HistoryAggregator;

/// Shared state handed to every handler. All members are cheap clones
/// around `Arc`ed internals.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: OrderStore,
    pub auth: AuthGateway,
    pub certificates: CertificateClient,
    pub history: HistoryAggregator,
    pub metrics: MetricsLog,
}

impl AppState {
    /// Assemble the state from configuration and an initialized store.
    ///
    /// One outbound HTTP client is built here and shared by every external
    /// collaborator, so the configured timeout bounds all outbound calls.
    /// A client that cannot be built is a startup error, not a silent
    /// fallback to unbounded requests.
    pub fn build(config: ServiceConfig, store: OrderStore) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let auth = AuthGateway::new(config.auth_url.clone(), client.clone());
        let certificates = CertificateClient::new(config.certificate_url.clone(), client.clone());
        let history = HistoryAggregator::new(config.siblings.clone(), client);
        let metrics = MetricsLog::new(config.metrics_path.clone());
        Ok(Self {
            config,
            store,
            auth,
            certificates,
            history,
            metrics,
        })
    }
}

impl FromRef<AppState> for AuthGateway {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for MetricsLog {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
