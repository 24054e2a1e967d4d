//! Rendering of method replies
//!
//! A [`Responder`] turns the normalized reply of an invoked method into the
//! transport response. Successful replies and reported failures go through
//! separate hooks so either can be replaced on its own. Decode failures and
//! panics never reach the responder; they always use the stock envelope.

use axum::response::{IntoResponse, Response};
use axum::Json;
use rigging_core::Normalized;

/// Renders normalized replies
pub trait Responder: Send + Sync + 'static {
    /// Render a reply without a reported failure
    fn success(&self, reply: Normalized) -> Response {
        render(reply)
    }

    /// Render a reply carrying a failure
    fn failure(&self, reply: Normalized) -> Response {
        render(reply)
    }
}

/// Stock rendering: the envelope as JSON, or an empty body
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeResponder;

impl Responder for EnvelopeResponder {}

/// Render a reply the stock way
///
/// The status and headers of the reply are always applied; custom responders
/// can call this and adjust the result.
pub fn render(reply: Normalized) -> Response {
    let Normalized {
        status,
        headers,
        envelope,
        ..
    } = reply;

    let mut response = match envelope {
        Some(envelope) => (status, Json(envelope)).into_response(),
        None => status.into_response(),
    };
    response.headers_mut().extend(headers);
    response
}

pub(crate) fn respond(responder: &dyn Responder, reply: Normalized) -> Response {
    if reply.failed {
        responder.failure(reply)
    } else {
        responder.success(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use rigging_core::{normalize, Failure, ReturnValues};
    use serde_json::json;

    struct Plain;

    impl Responder for Plain {
        fn failure(&self, reply: Normalized) -> Response {
            let message = reply
                .envelope
                .and_then(|envelope| envelope.message)
                .unwrap_or_default();
            (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_stock_rendering() {
        let reply = normalize(ReturnValues::PayloadAndSignal(Some(json!({"name": "a"})), None));
        let response = respond(&EnvelopeResponder, reply);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"result":{"name":"a"}}"#);

        let response = respond(&EnvelopeResponder, normalize(ReturnValues::Signal(None)));
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_hook_replaces_only_failures() {
        let failure = Failure::new(400).with_message("bad crate");
        let response = respond(&Plain, normalize(ReturnValues::Signal(Some(failure))));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_text(response).await, "bad crate");

        let reply = normalize(ReturnValues::PayloadAndSignal(Some(json!(1)), None));
        let response = respond(&Plain, reply);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"result":1}"#);
    }
}
