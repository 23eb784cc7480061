#![allow(dead_code)]

use axum::Router;

/// Serve a router on an ephemeral local port; returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Authentication service double: accepts any bearer token and answers
/// with a fixed identity for `username`.
pub fn auth_stub(username: &str) -> Router {
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Json;

    let username = username.to_string();
    Router::new().route(
        "/validate",
        post(move |headers: HeaderMap| {
            let username = username.clone();
            async move {
                if headers.get(AUTHORIZATION).is_none() {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(serde_json::json!({
                    "username": username,
                    "org": "orgA",
                    "roles": ["client"],
                })))
            }
        }),
    )
}

/// Certificate service double returning a fixed stamp.
pub fn certificate_stub() -> Router {
    use axum::routing::post;
    use axum::Json;

    Router::new().route(
        "/certificate",
        post(|| async {
            Json(serde_json::json!({
                "certificate": "deadbeef",
                "timestamp": "2026-01-01T00:00:00Z",
            }))
        }),
    )
}

/// Sibling instance double serving a fixed order listing.
pub fn sibling_stub(orders: serde_json::Value) -> Router {
    use axum::routing::get;
    use axum::Json;

    Router::new().route(
        "/orders",
        get(move || {
            let orders = orders.clone();
            async move { Json(serde_json::json!({ "orders": orders })) }
        }),
    )
}

/// An order row as a sibling would list it.
pub fn sibling_order(id: i64, order_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "order_id": order_id,
        "product_id": "p1",
        "quantity_ordered": 10,
        "status": "processed",
        "timestamp": "2026-01-01T00:00:00Z",
    })
}
