//! Per-request correlation.
//!
//! One [`RequestId`] is generated when a request enters the router and
//! stored in request extensions; the identity extractor and every handler
//! reuse it, so all metric records of one request share the same id.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use ordex_core::metrics::RequestId;

pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestId::new());
    next.run(request).await
}
