//! Method registration and invocation
//!
//! A service lists its methods in a [`MethodTable`]. Each registered
//! function's Rust type yields the [`Signature`] the classifier inspects, and
//! an erased invoker the dispatcher calls with positional arguments.

use crate::error::DecodeError;
use crate::param::{Arg, Param};
use crate::reply::Returns;
use rigging_core::{ReturnValues, Signature};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// Future produced by an invoked method
pub type ReplyFuture =
    Pin<Box<dyn Future<Output = Result<ReturnValues, serde_json::Error>> + Send>>;

/// An async function usable as a service method
///
/// Implemented for `Fn(Arc<S>, P0, .., Pn) -> impl Future` with up to six
/// parameters after the receiver, where every parameter implements
/// [`Param`] and the output implements [`Returns`]. `Args` only
/// distinguishes the arities.
pub trait Method<S, Args>: Clone + Send + Sync + Sized + 'static {
    /// Declared parameter and return types
    fn signature() -> Signature;

    /// Fill the parameters from `args` and start the call
    fn call(&self, service: Arc<S>, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError>;
}

macro_rules! impl_method {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, S, R, $($ty,)*> Method<S, ($($ty,)*)> for F
        where
            F: Fn(Arc<S>, $($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            S: Send + Sync + 'static,
            R: Returns,
            $($ty: Param,)*
        {
            fn signature() -> Signature {
                Signature::new(vec![$(<$ty as Param>::type_info()),*], R::shape())
            }

            fn call(&self, service: Arc<S>, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError> {
                let mut args = args.into_iter();
                $(
                    let $ty = <$ty as Param>::from_arg(args.next().unwrap_or(Arg::Vacant))?;
                )*
                let reply = (self)(service, $($ty,)*);
                Ok(Box::pin(async move { reply.await.into_values() }))
            }
        }
    };
}

impl_method!();
impl_method!(P0);
impl_method!(P0, P1);
impl_method!(P0, P1, P2);
impl_method!(P0, P1, P2, P3);
impl_method!(P0, P1, P2, P3, P4);
impl_method!(P0, P1, P2, P3, P4, P5);

/// Type-erased method of service `S`
pub(crate) trait ErasedMethod<S>: Send + Sync {
    fn call(&self, service: Arc<S>, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError>;
}

struct MethodHandle<M, T> {
    method: M,
    _marker: PhantomData<fn() -> T>,
}

impl<S, M, T> ErasedMethod<S> for MethodHandle<M, T>
where
    M: Method<S, T>,
    T: 'static,
{
    fn call(&self, service: Arc<S>, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError> {
        self.method.call(service, args)
    }
}

pub(crate) struct MethodEntry<S> {
    pub(crate) name: &'static str,
    pub(crate) signature: Signature,
    pub(crate) method: Arc<dyn ErasedMethod<S>>,
}

/// Registered methods of one service type, in registration order
pub struct MethodTable<S> {
    entries: Vec<MethodEntry<S>>,
}

impl<S: Send + Sync + 'static> MethodTable<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `method` under its exported name
    ///
    /// ```ignore
    /// table
    ///     .method("GetData", Inventory::get_data)
    ///     .method("Add", Inventory::add);
    /// ```
    pub fn method<M, T>(&mut self, name: &'static str, method: M) -> &mut Self
    where
        M: Method<S, T>,
        T: 'static,
    {
        self.entries.push(MethodEntry {
            name,
            signature: M::signature(),
            method: Arc::new(MethodHandle {
                method,
                _marker: PhantomData,
            }),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<MethodEntry<S>> {
        self.entries
    }
}

/// A method bound to its service instance
pub trait Invoke: Send + Sync {
    /// Build the parameters from `args` and start the call
    ///
    /// Parameter construction happens before the method runs, so an error
    /// here means the method was never invoked.
    fn invoke(&self, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError>;
}

pub(crate) struct BoundMethod<S> {
    pub(crate) service: Arc<S>,
    pub(crate) method: Arc<dyn ErasedMethod<S>>,
}

impl<S: Send + Sync + 'static> Invoke for BoundMethod<S> {
    fn invoke(&self, args: Vec<Arg>) -> Result<ReplyFuture, DecodeError> {
        self.method.call(Arc::clone(&self.service), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use crate::param::Record;
    use http::HeaderMap;
    use rigging_core::{Failure, TypeKind};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct LedgerEntry {
        name: String,
    }

    impl Record for LedgerEntry {}

    struct Ledger {
        owner: String,
    }

    impl Ledger {
        async fn add(self: Arc<Self>, _ctx: CallContext, entry: LedgerEntry) -> Option<Failure> {
            (entry.name.is_empty()).then(|| Failure::new(400).with_message("empty name"))
        }

        async fn owner(
            self: Arc<Self>,
            _ctx: CallContext,
            _headers: HeaderMap,
        ) -> Result<LedgerEntry, Failure> {
            Ok(LedgerEntry {
                name: self.owner.clone(),
            })
        }

        async fn bare(self: Arc<Self>) -> Option<Failure> {
            None
        }
    }

    fn ledger() -> Arc<Ledger> {
        Arc::new(Ledger {
            owner: "ada".to_string(),
        })
    }

    #[test]
    fn test_signatures() {
        let mut table = MethodTable::<Ledger>::new();
        table
            .method("Add", Ledger::add)
            .method("Owner", Ledger::owner)
            .method("Bare", Ledger::bare);
        assert_eq!(table.len(), 3);

        let entries = table.into_entries();
        let add = &entries[0].signature;
        assert_eq!(add.params().len(), 2);
        assert_eq!(add.params()[0].kind(), TypeKind::Context);
        assert_eq!(add.params()[1].name(), "LedgerEntry");
        assert_eq!(add.returns()[0].kind(), TypeKind::FailureSignal);

        let owner = &entries[1].signature;
        assert_eq!(owner.params()[1].kind(), TypeKind::HeaderMap);
        assert_eq!(owner.returns().len(), 2);

        assert!(entries[2].signature.params().is_empty());
    }

    #[tokio::test]
    async fn test_bound_invoke() {
        let mut table = MethodTable::<Ledger>::new();
        table.method("Owner", Ledger::owner);
        let entry = table.into_entries().remove(0);

        let bound = BoundMethod {
            service: ledger(),
            method: entry.method,
        };
        let reply = bound
            .invoke(vec![
                Arg::Context(CallContext::new()),
                Arg::Header(HeaderMap::new()),
            ])
            .unwrap();
        assert_eq!(
            reply.await.unwrap(),
            ReturnValues::PayloadAndSignal(Some(json!({"name": "ada"})), None)
        );
    }

    #[test]
    fn test_wrong_argument_is_not_invoked() {
        let mut table = MethodTable::<Ledger>::new();
        table.method("Add", Ledger::add);
        let entry = table.into_entries().remove(0);

        let result = entry
            .method
            .call(ledger(), vec![Arg::Context(CallContext::new()), Arg::Vacant]);
        assert!(matches!(result, Err(DecodeError::SlotMismatch { .. })));
    }
}
