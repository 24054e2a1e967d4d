//! Capability probes over declared type shapes

use crate::shape::{TypeInfo, TypeKind};

/// Suffix marking a record as the query-string slot
pub const QUERY_SUFFIX: &str = "Query";

/// Does the type carry the request-scoped, cancellation-aware context?
pub fn is_execution_context(ty: &TypeInfo) -> bool {
    ty.kind() == TypeKind::Context
}

/// Is the type the literal inbound header map?
pub fn is_header_map(ty: &TypeInfo) -> bool {
    ty.kind() == TypeKind::HeaderMap
}

/// Can the type report success or a failure?
pub fn is_failure_signal(ty: &TypeInfo) -> bool {
    ty.kind() == TypeKind::FailureSignal
}

/// Is the type a record, by value or by reference?
pub fn is_record(ty: &TypeInfo) -> bool {
    ty.kind() == TypeKind::Record
}

/// Can the type be returned as a result payload?
pub fn is_payload(ty: &TypeInfo) -> bool {
    matches!(ty.kind(), TypeKind::Record | TypeKind::RecordSequence)
}

/// Is the type a record decoded from the query string?
pub fn is_query_record(ty: &TypeInfo) -> bool {
    is_record(ty) && ty.name().ends_with(QUERY_SUFFIX)
}
