//! Client for the external certificate stamping service.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stamp returned by the certificate service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct CertificateClient {
    client: reqwest::Client,
    base_url: String,
}

impl CertificateClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Request a stamp for an arbitrary payload.
    ///
    /// Certificate absence is non-fatal by design: any failure is logged
    /// and collapsed to `None`, and the calling request still succeeds.
    pub async fn stamp(&self, payload: &serde_json::Value) -> Option<Certificate> {
        let result = self
            .client
            .post(format!("{}/certificate", self.base_url))
            .json(payload)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Certificate>().await {
                    Ok(certificate) => Some(certificate),
                    Err(err) => {
                        warn!(error = %err, "certificate response malformed");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "certificate request rejected");
                None
            }
            Err(err) => {
                warn!(error = %err, "certificate service unreachable");
                None
            }
        }
    }
}
