//! Method return values
//!
//! A method returns either a failure signal alone or a payload together with
//! a failure signal. [`Returns`] reports the declared shape for
//! classification and converts the produced values into [`ReturnValues`]
//! for the normalizer.

use crate::param::Record;
use rigging_core::{short_type_name, Failure, ReturnValues, TypeInfo};
use serde_json::Value;

/// A value able to report success or a failure
pub trait FailureSignal: Send + 'static {
    fn into_failure(self) -> Failure;

    fn type_info() -> TypeInfo
    where
        Self: Sized,
    {
        TypeInfo::failure_signal(short_type_name(std::any::type_name::<Self>()))
    }
}

impl FailureSignal for Failure {
    fn into_failure(self) -> Failure {
        self
    }
}

/// Plain errors carry only their text
impl FailureSignal for Box<dyn std::error::Error + Send + Sync> {
    fn into_failure(self) -> Failure {
        Failure::from_error(&*self)
    }

    fn type_info() -> TypeInfo {
        TypeInfo::failure_signal("Error")
    }
}

/// A value that can be placed in the envelope's `result` field
pub trait Payload: Send + 'static {
    fn type_info() -> TypeInfo;

    /// `None` leaves the result absent
    fn into_payload(self) -> Result<Option<Value>, serde_json::Error>;
}

impl<T: Record> Payload for T {
    fn type_info() -> TypeInfo {
        <T as Record>::type_info()
    }

    fn into_payload(self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(self).map(Some)
    }
}

/// An absent record produces no result
impl<T: Record> Payload for Option<T> {
    fn type_info() -> TypeInfo {
        <T as Record>::type_info().by_ref()
    }

    fn into_payload(self) -> Result<Option<Value>, serde_json::Error> {
        self.map(serde_json::to_value).transpose()
    }
}

impl<T: Record> Payload for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::record_sequence(<T as Record>::type_info().name())
    }

    fn into_payload(self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(self).map(Some)
    }
}

macro_rules! impl_scalar_payload {
    ($($ty:ty),*) => {
        $(
            impl Payload for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::scalar(stringify!($ty))
                }

                fn into_payload(self) -> Result<Option<Value>, serde_json::Error> {
                    serde_json::to_value(self).map(Some)
                }
            }
        )*
    };
}

impl_scalar_payload!(String, bool, i64, u64, f64);

/// The complete return type of a method
pub trait Returns: Send + 'static {
    /// Declared return types, in order
    fn shape() -> Vec<TypeInfo>;

    fn into_values(self) -> Result<ReturnValues, serde_json::Error>;
}

impl Returns for () {
    fn shape() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        Ok(ReturnValues::Unrecognized { arity: 0 })
    }
}

impl<E: FailureSignal> Returns for Option<E> {
    fn shape() -> Vec<TypeInfo> {
        vec![E::type_info()]
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        Ok(ReturnValues::Signal(self.map(E::into_failure)))
    }
}

impl<E: FailureSignal> Returns for Result<(), E> {
    fn shape() -> Vec<TypeInfo> {
        vec![E::type_info()]
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        Ok(ReturnValues::Signal(self.err().map(E::into_failure)))
    }
}

impl<T: Payload, E: FailureSignal> Returns for Result<T, E> {
    fn shape() -> Vec<TypeInfo> {
        vec![T::type_info(), E::type_info()]
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        Ok(match self {
            Ok(payload) => ReturnValues::PayloadAndSignal(payload.into_payload()?, None),
            Err(failure) => ReturnValues::PayloadAndSignal(None, Some(failure.into_failure())),
        })
    }
}

/// Payload and failure reported together
impl<T: Payload, E: FailureSignal> Returns for (T, Option<E>) {
    fn shape() -> Vec<TypeInfo> {
        vec![T::type_info(), E::type_info()]
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        let (payload, failure) = self;
        Ok(ReturnValues::PayloadAndSignal(
            payload.into_payload()?,
            failure.map(E::into_failure),
        ))
    }
}

impl<A: Payload, B: Payload, E: FailureSignal> Returns for (A, B, Option<E>) {
    fn shape() -> Vec<TypeInfo> {
        vec![A::type_info(), B::type_info(), E::type_info()]
    }

    fn into_values(self) -> Result<ReturnValues, serde_json::Error> {
        Ok(ReturnValues::Unrecognized { arity: 3 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigging_core::TypeKind;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Crate {
        name: String,
    }

    impl Record for Crate {}

    fn failure(code: i64) -> Failure {
        Failure::new(code).with_message("bad crate")
    }

    #[test]
    fn test_shapes() {
        let shape = <Result<Crate, Failure>>::shape();
        assert_eq!(shape.len(), 2);
        assert_eq!(shape[0].kind(), TypeKind::Record);
        assert_eq!(shape[1].name(), "Failure");

        let shape = <Result<Vec<Crate>, Failure>>::shape();
        assert_eq!(shape[0].kind(), TypeKind::RecordSequence);
        assert_eq!(shape[0].name(), "Crate");

        let shape = <Option<Box<dyn std::error::Error + Send + Sync>>>::shape();
        assert_eq!(shape[0].name(), "Error");
        assert_eq!(shape[0].kind(), TypeKind::FailureSignal);

        assert!(<()>::shape().is_empty());
        assert_eq!(<(Crate, Crate, Option<Failure>)>::shape().len(), 3);
    }

    #[test]
    fn test_payload_values() {
        let ok: Result<Crate, Failure> = Ok(Crate {
            name: "alpha".to_string(),
        });
        assert_eq!(
            ok.into_values().unwrap(),
            ReturnValues::PayloadAndSignal(Some(json!({"name": "alpha"})), None)
        );

        let err: Result<Crate, Failure> = Err(failure(7));
        assert_eq!(
            err.into_values().unwrap(),
            ReturnValues::PayloadAndSignal(None, Some(failure(7)))
        );

        let absent: Result<Option<Crate>, Failure> = Ok(None);
        assert_eq!(
            absent.into_values().unwrap(),
            ReturnValues::PayloadAndSignal(None, None)
        );
    }

    #[test]
    fn test_payload_with_failure() {
        let values = (
            Crate {
                name: "beta".to_string(),
            },
            Some(failure(3)),
        )
            .into_values()
            .unwrap();
        assert_eq!(
            values,
            ReturnValues::PayloadAndSignal(Some(json!({"name": "beta"})), Some(failure(3)))
        );
    }

    #[test]
    fn test_signal_values() {
        assert_eq!(
            Option::<Failure>::None.into_values().unwrap(),
            ReturnValues::Signal(None)
        );

        let plain: Result<(), Box<dyn std::error::Error + Send + Sync>> =
            Err("disk full".into());
        match plain.into_values().unwrap() {
            ReturnValues::Signal(Some(failure)) => {
                assert_eq!(failure.code, 0);
                assert_eq!(failure.error, "disk full");
            }
            other => panic!("unexpected values: {other:?}"),
        }
    }
}
