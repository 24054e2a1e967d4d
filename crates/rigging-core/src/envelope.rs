//! Response envelope and the normalizer that produces it.

use crate::failure::Failure;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform wire shape of every action response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Envelope carrying only a result payload
    pub fn result(payload: Value) -> Self {
        Self {
            result: Some(payload),
            ..Self::default()
        }
    }

    /// Build the envelope for a failure, keeping only the fields it reports
    pub fn from_failure(failure: &Failure, payload: Option<Value>) -> Self {
        Self {
            result: payload,
            code: (failure.code > 0).then_some(failure.code),
            message: non_empty(&failure.message),
            error: non_empty(&failure.error),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Values returned by an invoked method, tagged by declared shape
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValues {
    /// A method declaring only a failure signal
    Signal(Option<Failure>),
    /// A method declaring a payload and a failure signal
    PayloadAndSignal(Option<Value>, Option<Failure>),
    /// A shape the classifier never admits
    Unrecognized { arity: usize },
}

/// Transport-ready outcome of normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` means an empty body
    pub envelope: Option<Envelope>,
    /// The method reported a failure
    pub failed: bool,
}

impl Normalized {
    fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            envelope: None,
            failed: false,
        }
    }

    fn failure(failure: Failure, payload: Option<Value>) -> Self {
        let envelope = Envelope::from_failure(&failure, payload);
        Self {
            status: StatusCode::OK,
            headers: failure.headers,
            envelope: Some(envelope),
            failed: true,
        }
    }
}

/// Map a method's return values onto the response envelope
///
/// Failures are reported in-band: the transport status stays 200 and the
/// failure's code travels in the envelope.
///
/// # Panics
///
/// Panics on [`ReturnValues::Unrecognized`]. Such a shape can only reach this
/// point if classification was bypassed.
pub fn normalize(values: ReturnValues) -> Normalized {
    match values {
        ReturnValues::Signal(None) | ReturnValues::PayloadAndSignal(None, None) => {
            Normalized::empty()
        }
        ReturnValues::PayloadAndSignal(Some(payload), None) => Normalized {
            envelope: Some(Envelope::result(payload)),
            ..Normalized::empty()
        },
        ReturnValues::Signal(Some(failure)) => Normalized::failure(failure, None),
        ReturnValues::PayloadAndSignal(payload, Some(failure)) => {
            Normalized::failure(failure, payload)
        }
        ReturnValues::Unrecognized { arity } => {
            panic!("return shape with {arity} values reached the normalizer")
        }
    }
}
