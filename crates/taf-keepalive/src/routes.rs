//! Route definitions
//!
//! The keep-alive surface is deliberately tiny: a health endpoint for the
//! platform and external uptime monitors. Everything else about the
//! service lives in the bot worker, not here.

use axum::{Router, routing::get};

/// Create the keep-alive router.
pub fn routes() -> Router {
    Router::new().route("/health", get(health))
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let app = routes();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 16).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = routes();
        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
