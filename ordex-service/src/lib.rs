pub mod auth;
pub mod certificate;
pub mod error;
pub mod history;
pub mod request_id;
pub mod routes;
pub mod state;

pub use auth::{AuthError, AuthGateway, Identity};
pub use certificate::{Certificate, CertificateClient};
pub use error::ApiError;
pub use history::HistoryAggregator;
pub use routes::router;
pub use state::AppState;
