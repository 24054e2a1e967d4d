//! Stock interceptors and the not-found fallback
//!
//! Each function returns an [`Interceptor`] wrapping a `tower-http` layer.
//! Register them on the server as pre interceptors (bound actions only) or
//! post interceptors (the whole application):
//!
//! ```ignore
//! let server = ApiServer::new(config)
//!     .with_post_interceptor(middleware::trace())
//!     .with_post_interceptor(middleware::cors(&["*".to_string()]))
//!     .with_pre_interceptor(middleware::catch_panic());
//! ```

use crate::server::Interceptor;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{Method, StatusCode, Uri};
use rigging_core::{Envelope, Failure};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request/response tracing spans
pub fn trace() -> Interceptor {
    Interceptor::layer(TraceLayer::new_for_http())
}

/// gzip response compression
pub fn compression() -> Interceptor {
    Interceptor::layer(CompressionLayer::new())
}

/// Cross-origin resource sharing for the given origins
///
/// A `"*"` entry allows any origin; entries that do not parse as header
/// values are ignored.
pub fn cors(origins: &[String]) -> Interceptor {
    Interceptor::layer(build_cors_layer(origins))
}

/// Turns panics escaping inner layers into plain 500 responses
///
/// Panics inside service methods never get this far; the dispatcher reports
/// them with an envelope.
pub fn catch_panic() -> Interceptor {
    Interceptor::layer(CatchPanicLayer::new())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Fallback for paths with no bound action
pub(crate) async fn not_found(uri: Uri) -> Response {
    let failure = Failure::new(i64::from(StatusCode::NOT_FOUND.as_u16()))
        .with_message("not found")
        .with_error(uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::from_failure(&failure, None)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::routing::get;
    use axum::Router;
    use http::header::{ACCEPT_ENCODING, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_ENCODING, ORIGIN};
    use tower::ServiceExt;

    async fn boom() -> &'static str {
        panic!("boom")
    }

    fn app(interceptor: Interceptor) -> Router {
        let router = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/big", get(|| async { "crate ".repeat(256) }))
            .route("/boom", get(boom));
        interceptor.apply(router)
    }

    fn get_with(uri: &str, header: http::HeaderName, value: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(header, value)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_wildcard() {
        let response = app(cors(&["*".to_string()]))
            .oneshot(get_with("/ping", ORIGIN, "https://depot.example"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_cors_listed_origins_only() {
        let router = app(cors(&[
            "https://depot.example".to_string(),
            "bad\norigin".to_string(),
        ]));

        let response = router
            .clone()
            .oneshot(get_with("/ping", ORIGIN, "https://depot.example"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://depot.example"
        );

        let response = router
            .oneshot(get_with("/ping", ORIGIN, "https://elsewhere.example"))
            .await
            .unwrap();
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_compression_when_accepted() {
        let router = app(compression());

        let response = router
            .clone()
            .oneshot(get_with("/big", ACCEPT_ENCODING, "gzip"))
            .await
            .unwrap();
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");

        let response = router
            .oneshot(Request::builder().uri("/big").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn test_catch_panic_returns_500() {
        let router = app(catch_panic());

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = router
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = not_found("/api/v1/missing/action?x=1".parse().unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let envelope: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.code, Some(404));
        assert_eq!(envelope.message.as_deref(), Some("not found"));
        assert_eq!(envelope.error.as_deref(), Some("/api/v1/missing/action"));
        assert!(envelope.result.is_none());
    }
}
