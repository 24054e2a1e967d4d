//! Core types for the rigging action binder.
//!
//! This crate holds everything that can be decided without a transport:
//! - Declared type shapes and method signatures
//! - Capability probes over those shapes
//! - Naming conventions (verb, resource, action)
//! - Signature classification into action plans
//! - Failure signals, the response envelope and its normalizer

pub mod classify;
pub mod envelope;
pub mod failure;
pub mod naming;
pub mod plan;
pub mod probe;
pub mod shape;

pub use classify::{classify, Disqualified, MAX_SLOTS};
pub use envelope::{normalize, Envelope, Normalized, ReturnValues};
pub use failure::Failure;
pub use naming::{resolve, Route};
pub use plan::{ActionPlan, ResultArity, Slot, SlotKind, Verb};
pub use shape::{short_type_name, Signature, TypeInfo, TypeKind};
