//! Append-only CSV metrics log with per-request correlation.
//!
//! Every significant step of a request's lifecycle appends one record. The
//! log is strictly best-effort: a failed write is logged at warn level and
//! never surfaces to the calling operation.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

/// Correlation id linking every metric record emitted while handling one
/// logical request. Generated once per inbound HTTP request and carried in
/// the request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome recorded with a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricStatus {
    Success,
    Failed,
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricStatus::Success => f.write_str("success"),
            MetricStatus::Failed => f.write_str("failed"),
        }
    }
}

const HEADER: &str = "request_id,timestamp,event_type,user,status,details";

/// Handle to the shared CSV metrics file.
///
/// Cloning is cheap; all clones serialize writes through one lock so
/// concurrent HTTP handlers and the consumer task never interleave rows.
#[derive(Clone)]
pub struct MetricsLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file with a header row if needed.
    /// Never fails the caller.
    pub fn record(
        &self,
        request_id: &RequestId,
        event_type: &str,
        user: Option<&str>,
        status: MetricStatus,
        details: &str,
    ) {
        if let Err(err) = self.try_record(request_id, event_type, user, status, details) {
            warn!(path = %self.path.display(), error = %err, "metrics write failed");
        }
    }

    fn try_record(
        &self,
        request_id: &RequestId,
        event_type: &str,
        user: Option<&str>,
        status: MetricStatus,
        details: &str,
    ) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let fresh = !self.path.exists();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if fresh {
            writeln!(file, "{HEADER}")?;
        }
        writeln!(
            file,
            "{},{},{},{},{},{}",
            escape(request_id.as_str()),
            Utc::now().to_rfc3339(),
            escape(event_type),
            escape(user.unwrap_or("")),
            status,
            escape(details),
        )
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
