//! Server side of rigging.
//!
//! This crate turns a service struct into HTTP actions:
//! - Typed service surface (records, parameters, replies, method tables)
//! - Binding engine producing frozen descriptor tables
//! - Per-action request dispatcher with panic containment
//! - Pluggable structured decoder (JSON and forms by default)
//! - Replaceable reply rendering
//! - Interceptors and stock middleware
//! - Server lifecycle on top of axum

pub mod binder;
pub mod config;
pub mod context;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod method;
pub mod middleware;
pub mod param;
pub mod reply;
pub mod responder;
pub mod server;
pub mod service;

pub use binder::{ActionDescriptor, DescriptorTable};
pub use config::ServerConfig;
pub use context::CallContext;
pub use decoder::{ContentDecoder, Document, FormDecoder, JsonDecoder, StructuredDecoder};
pub use error::{BindError, ConfigError, DecodeError, ServerError};
pub use method::{Invoke, Method, MethodTable, ReplyFuture};
pub use param::{Arg, BodyInput, Param, Record};
pub use reply::{FailureSignal, Payload, Returns};
pub use responder::{EnvelopeResponder, Responder};
pub use server::{shutdown_signal, ApiServer, Interceptor, RunningServer};
pub use service::Service;

pub use rigging_core::{Envelope, Failure, Normalized, Verb};
