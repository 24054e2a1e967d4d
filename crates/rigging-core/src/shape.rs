//! Declared type shapes.
//!
//! A [`Signature`] is the bind-time view of a service method: one
//! [`TypeInfo`] per declared parameter (the receiver excluded) and one per
//! returned value. The shapes are produced from Rust types by trait
//! conformance in the server crate and consumed here by the classifier.

use std::fmt;

/// What a declared type is able to stand for in an action signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Cancellation-aware execution context
    Context,
    /// The inbound HTTP header map
    HeaderMap,
    /// A named record (struct) that can be decoded or encoded
    Record,
    /// A sequence of records
    RecordSequence,
    /// A value reporting success/absence or a failure
    FailureSignal,
    /// Anything else: numbers, strings, unit
    Scalar,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Context => "context",
            TypeKind::HeaderMap => "header map",
            TypeKind::Record => "record",
            TypeKind::RecordSequence => "record sequence",
            TypeKind::FailureSignal => "failure signal",
            TypeKind::Scalar => "scalar",
        }
    }
}

/// Shape of one declared parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    name: &'static str,
    kind: TypeKind,
    by_ref: bool,
}

impl TypeInfo {
    /// Create a by-value type shape
    pub const fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            by_ref: false,
        }
    }

    pub const fn context(name: &'static str) -> Self {
        Self::new(name, TypeKind::Context)
    }

    pub const fn header_map() -> Self {
        Self::new("HeaderMap", TypeKind::HeaderMap)
    }

    pub const fn record(name: &'static str) -> Self {
        Self::new(name, TypeKind::Record)
    }

    pub const fn record_sequence(name: &'static str) -> Self {
        Self::new(name, TypeKind::RecordSequence)
    }

    pub const fn failure_signal(name: &'static str) -> Self {
        Self::new(name, TypeKind::FailureSignal)
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, TypeKind::Scalar)
    }

    /// Mark the shape as passed by reference (boxed)
    pub const fn by_ref(self) -> Self {
        Self {
            by_ref: true,
            ..self
        }
    }

    /// Short (unqualified) type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_ref {
            write!(f, "Box<{}>", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// Declared parameter and return shapes of one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<TypeInfo>,
    returns: Vec<TypeInfo>,
}

impl Signature {
    pub fn new(params: Vec<TypeInfo>, returns: Vec<TypeInfo>) -> Self {
        Self { params, returns }
    }

    /// Declared parameters, execution context included
    pub fn params(&self) -> &[TypeInfo] {
        &self.params
    }

    pub fn returns(&self) -> &[TypeInfo] {
        &self.returns
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")?;

        match self.returns.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {}", single),
            many => {
                f.write_str(" -> (")?;
                for (i, ret) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", ret)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Strip the module path and generic arguments from a type name
///
/// `inventory::model::InventoryQuery` becomes `InventoryQuery` and
/// `alloc::vec::Vec<demo::Item>` becomes `Vec`.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("inventory::InventoryQuery"), "InventoryQuery");
        assert_eq!(short_type_name("alloc::vec::Vec<demo::Item>"), "Vec");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("u32"), "u32");
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature::new(
            vec![
                TypeInfo::context("CallContext"),
                TypeInfo::record("InventoryQuery").by_ref(),
            ],
            vec![
                TypeInfo::record("InventoryRecord"),
                TypeInfo::failure_signal("Failure"),
            ],
        );

        assert_eq!(
            sig.to_string(),
            "fn(CallContext, Box<InventoryQuery>) -> (InventoryRecord, Failure)"
        );
    }
}
