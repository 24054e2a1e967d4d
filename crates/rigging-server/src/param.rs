//! Method parameters and the arguments that fill them
//!
//! Every parameter type reports its declared shape for classification and
//! knows how to build itself from the positional [`Arg`] the dispatcher
//! prepared for its slot.

use crate::context::CallContext;
use crate::decoder::{decode_record, StructuredDecoder};
use crate::error::DecodeError;
use axum::extract::Query;
use bytes::Bytes;
use http::{HeaderMap, Uri};
use rigging_core::{short_type_name, TypeInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A named record usable as query, body or result payload
///
/// Records whose type name ends with `Query` are decoded from the query
/// string, every other record from the request body.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct InventoryQuery {
///     name: String,
/// }
///
/// impl Record for InventoryQuery {}
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn type_info() -> TypeInfo {
        TypeInfo::record(short_type_name(std::any::type_name::<Self>()))
    }
}

/// Boxed records are passed by reference
impl<T: Record> Record for Box<T> {
    fn type_info() -> TypeInfo {
        T::type_info().by_ref()
    }
}

/// Raw input for one request body
#[derive(Clone)]
pub struct BodyInput {
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub decoder: Arc<dyn StructuredDecoder>,
}

impl BodyInput {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        decode_record(self.decoder.as_ref(), self.content_type.as_deref(), &self.bytes)
    }
}

/// Positional argument prepared by the dispatcher
pub enum Arg {
    Context(CallContext),
    Header(HeaderMap),
    /// The request URI; its query string fills the query slot
    Query(Uri),
    Body(BodyInput),
    /// Nothing was prepared for this position
    Vacant,
}

impl Arg {
    fn kind_name(&self) -> &'static str {
        match self {
            Arg::Context(_) => "context",
            Arg::Header(_) => "header",
            Arg::Query(_) => "query",
            Arg::Body(_) => "body",
            Arg::Vacant => "vacant",
        }
    }
}

/// A type that can appear as a method parameter
pub trait Param: Sized + Send + 'static {
    /// Declared shape used by the classifier
    fn type_info() -> TypeInfo;

    /// Build the parameter from its positional argument
    fn from_arg(arg: Arg) -> Result<Self, DecodeError>;
}

impl Param for CallContext {
    fn type_info() -> TypeInfo {
        TypeInfo::context("CallContext")
    }

    fn from_arg(arg: Arg) -> Result<Self, DecodeError> {
        match arg {
            Arg::Context(ctx) => Ok(ctx),
            other => Err(DecodeError::SlotMismatch {
                expected: "context",
                found: other.kind_name(),
            }),
        }
    }
}

impl Param for HeaderMap {
    fn type_info() -> TypeInfo {
        TypeInfo::header_map()
    }

    fn from_arg(arg: Arg) -> Result<Self, DecodeError> {
        match arg {
            Arg::Header(headers) => Ok(headers),
            other => Err(DecodeError::SlotMismatch {
                expected: "header",
                found: other.kind_name(),
            }),
        }
    }
}

impl<T: Record> Param for T {
    fn type_info() -> TypeInfo {
        <T as Record>::type_info()
    }

    fn from_arg(arg: Arg) -> Result<Self, DecodeError> {
        match arg {
            Arg::Query(uri) => Query::<T>::try_from_uri(&uri)
                .map(|Query(record)| record)
                .map_err(|rejection| DecodeError::Query(rejection.body_text())),
            Arg::Body(body) => body.decode(),
            other => Err(DecodeError::SlotMismatch {
                expected: "record",
                found: other.kind_name(),
            }),
        }
    }
}

/// Scalar parameters are never valid slots; they exist so such methods can
/// be registered and then rejected by classification.
macro_rules! impl_scalar_param {
    ($($ty:ty),*) => {
        $(
            impl Param for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::scalar(stringify!($ty))
                }

                fn from_arg(arg: Arg) -> Result<Self, DecodeError> {
                    Err(DecodeError::SlotMismatch {
                        expected: "scalar",
                        found: arg.kind_name(),
                    })
                }
            }
        )*
    };
}

impl_scalar_param!(String, bool, i64, u64);
