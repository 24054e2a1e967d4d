//! Action plans: the transport-independent half of an action descriptor

use crate::naming::Route;
use crate::shape::TypeInfo;
use std::fmt;

/// HTTP verbs an action can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Options,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Options => "OPTIONS",
            Verb::Post => "POST",
        }
    }

    /// Convert to the `http` crate method
    pub fn as_method(&self) -> http::Method {
        match self {
            Verb::Get => http::Method::GET,
            Verb::Options => http::Method::OPTIONS,
            Verb::Post => http::Method::POST,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a classified parameter is filled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Header,
    Query,
    Body,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Header => "header",
            SlotKind::Query => "query",
            SlotKind::Body => "body",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified parameter position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    /// Index in the declared parameter list; the context sits at 0
    pub position: usize,
    pub type_info: TypeInfo,
}

/// Number of values a method returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultArity {
    /// Failure signal only
    SignalOnly,
    /// Payload followed by a failure signal
    PayloadAndSignal,
}

impl ResultArity {
    pub fn count(&self) -> usize {
        match self {
            ResultArity::SignalOnly => 1,
            ResultArity::PayloadAndSignal => 2,
        }
    }
}

/// Everything the binder knows about one valid action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    /// Registered method name
    pub method: String,
    pub route: Route,
    /// Slots ordered by position
    pub slots: Vec<Slot>,
    pub arity: ResultArity,
}

impl ActionPlan {
    pub fn verb(&self) -> Verb {
        self.route.verb
    }

    pub fn resource(&self) -> &str {
        &self.route.resource
    }

    pub fn action(&self) -> &str {
        &self.route.action
    }

    /// Find the slot of the given kind, if the method declares one
    pub fn slot(&self, kind: SlotKind) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }

    /// Number of declared parameters, execution context included
    pub fn param_count(&self) -> usize {
        self.slots.len() + 1
    }
}

impl fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.route.verb, self.route.resource, self.route.action)
    }
}
