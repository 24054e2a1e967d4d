//! Request dispatcher
//!
//! One dispatcher serves one bound action. For every request it builds the
//! positional arguments from the action plan, invokes the method and
//! normalizes what it returned. Panics raised while invoking or normalizing
//! are contained here and reported as an internal-error envelope.

use crate::binder::ActionDescriptor;
use crate::context::CallContext;
use crate::decoder::StructuredDecoder;
use crate::error::DecodeError;
use crate::param::{Arg, BodyInput};
use crate::responder::{respond, Responder};
use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::FutureExt;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use rigging_core::{normalize, Envelope, Failure, SlotKind};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug_span, error, Instrument, Span};

/// Settings shared by every dispatcher of one server
#[derive(Clone)]
pub(crate) struct DispatchSettings {
    pub(crate) decoder: Arc<dyn StructuredDecoder>,
    pub(crate) responder: Arc<dyn Responder>,
    pub(crate) body_limit: usize,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) span: Span,
}

/// Serves requests for one bound action
#[derive(Clone)]
pub struct Dispatcher {
    descriptor: Arc<ActionDescriptor>,
    settings: Arc<DispatchSettings>,
}

impl Dispatcher {
    pub(crate) fn new(descriptor: Arc<ActionDescriptor>, settings: Arc<DispatchSettings>) -> Self {
        Self {
            descriptor,
            settings,
        }
    }

    /// Handle one request end to end
    pub async fn dispatch(&self, request: Request) -> Response {
        let plan = &self.descriptor.plan;
        let span = debug_span!(
            parent: &self.settings.span,
            "dispatch",
            verb = %plan.verb(),
            resource = plan.resource(),
            action = plan.action(),
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: Request) -> Response {
        let ctx = match self.settings.request_timeout {
            Some(timeout) => CallContext::new().with_timeout(timeout),
            None => CallContext::new(),
        };
        // Cancelled once the response is produced or the request future is dropped
        let _cancel = ctx.cancel_on_drop();

        let args = match self.build_args(ctx, request).await {
            Ok(args) => args,
            Err(err) => return decode_failure(err),
        };

        let invoker = Arc::clone(&self.descriptor.invoker);
        let outcome = match catch_unwind(AssertUnwindSafe(|| invoker.invoke(args))) {
            Ok(Ok(reply)) => {
                AssertUnwindSafe(async move { reply.await.map(normalize) })
                    .catch_unwind()
                    .await
            }
            Ok(Err(err)) => return decode_failure(err),
            Err(panic) => Err(panic),
        };

        match outcome {
            Ok(Ok(normalized)) => respond(self.settings.responder.as_ref(), normalized),
            Ok(Err(err)) => {
                error!(error = %err, "Failed to serialize action result");
                internal_failure(err.to_string())
            }
            Err(panic) => {
                let plan = &self.descriptor.plan;
                let message = panic_message(panic.as_ref());
                error!(
                    verb = %plan.verb(),
                    resource = plan.resource(),
                    action = plan.action(),
                    panic = %message,
                    "Action panicked"
                );
                internal_failure(message)
            }
        }
    }

    /// Fill every declared position; slot 0 is always the context
    async fn build_args(&self, ctx: CallContext, request: Request) -> Result<Vec<Arg>, DecodeError> {
        let plan = &self.descriptor.plan;
        let (parts, body) = request.into_parts();
        let mut body = Some(body);

        let mut args: Vec<Arg> = Vec::with_capacity(plan.param_count());
        args.push(Arg::Context(ctx));
        args.resize_with(plan.param_count(), || Arg::Vacant);

        for slot in &plan.slots {
            let arg = match slot.kind {
                SlotKind::Header => Arg::Header(parts.headers.clone()),
                SlotKind::Query => Arg::Query(parts.uri.clone()),
                SlotKind::Body => {
                    let Some(body) = body.take() else {
                        continue;
                    };
                    let content_type = parts
                        .headers
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    Arg::Body(BodyInput {
                        content_type,
                        bytes: self.read_body(body).await?,
                        decoder: Arc::clone(&self.settings.decoder),
                    })
                }
            };
            if let Some(target) = args.get_mut(slot.position) {
                *target = arg;
            }
        }

        Ok(args)
    }

    async fn read_body(&self, body: Body) -> Result<bytes::Bytes, DecodeError> {
        axum::body::to_bytes(body, self.settings.body_limit)
            .await
            .map_err(|e| DecodeError::BodyRead(e.to_string()))
    }
}

fn decode_failure(err: DecodeError) -> Response {
    let status = err.status_code();
    let failure = Failure::new(i64::from(status.as_u16()))
        .with_message(err.summary())
        .with_error(err.to_string());
    (status, Json(Envelope::from_failure(&failure, None))).into_response()
}

fn internal_failure(message: String) -> Response {
    let failure = Failure::internal(message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::from_failure(&failure, None)),
    )
        .into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
