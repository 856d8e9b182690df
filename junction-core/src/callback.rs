//! # Callback Descriptors
//!
//! A [`Callback`] is the resolved, ready-to-invoke form of one registered RPC
//! method. It wraps an ordinary async function whose signature is erased at
//! registration time; the declared parameter types are kept as [`ArgType`]s and
//! the incoming JSON values are converted into them once, at call time.
//!
//! # Registration
//!
//! ```rust,ignore
//! // First parameter is the call context.
//! let echo = Callback::with_context(|_ctx: CallContext, s: String| async move {
//!     Ok::<_, RpcError>(s)
//! });
//!
//! // No context.
//! let add = Callback::new(|a: i64, b: i64| async move { Ok::<_, RpcError>(a + b) });
//!
//! assert!(echo.has_context());
//! assert_eq!(add.arg_types().len(), 2);
//! ```
//!
//! Handlers take up to eight parameters implementing `DeserializeOwned` and
//! return any [`IntoMethodResult`] type.

use crate::{
    context::CallContext,
    error::RpcError,
    result::{IntoMethodResult, MethodResult},
};
use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

/// Positional argument values of a call.
pub type Params = Vec<Value>;

/// The declared runtime type of one positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgType {
    name: &'static str,
}

impl ArgType {
    /// The argument type for `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
        }
    }

    /// The Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An async function usable as an RPC method without a context parameter.
///
/// Implemented for `Fn(A1, .., An) -> impl Future` closures and functions with
/// `n <= 8`. The `Args` parameter is a tuple of the argument types and only
/// serves to keep the arity impls apart.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as an RPC method",
    label = "not a valid handler",
    note = "Handlers are async functions whose arguments implement `DeserializeOwned` and whose output implements `IntoMethodResult`."
)]
pub trait Handler<Args>: Send + Sync + 'static {
    /// The handler's output.
    type Output: IntoMethodResult;

    /// Declared argument types, in order.
    fn arg_types() -> Vec<ArgType>;

    /// Convert `args` and invoke the function.
    fn invoke(&self, args: Params) -> BoxFuture<'static, MethodResult>;
}

/// An async function usable as an RPC method whose first parameter is a
/// [`CallContext`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a context-taking RPC method",
    label = "not a valid context handler",
    note = "Context handlers take `CallContext` first, then arguments implementing `DeserializeOwned`."
)]
pub trait ContextHandler<Args>: Send + Sync + 'static {
    /// The handler's output.
    type Output: IntoMethodResult;

    /// Declared argument types, in order, excluding the context.
    fn arg_types() -> Vec<ArgType>;

    /// Convert `args` and invoke the function with `ctx` prepended.
    fn invoke(&self, ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult>;
}

fn arity_mismatch(expected: usize, got: usize) -> BoxFuture<'static, MethodResult> {
    future::ready(MethodResult::err(RpcError::invalid_params(format!(
        "wrong number of arguments: expected {expected}, got {got}"
    ))))
    .boxed()
}

fn decode<T: DeserializeOwned>(index: usize, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::invalid_params(format!("invalid argument {index}: {e}")))
}

fn finish<Fut>(fut: Fut) -> BoxFuture<'static, MethodResult>
where
    Fut: Future + Send + 'static,
    Fut::Output: IntoMethodResult,
{
    async move { fut.await.into_method_result() }.boxed()
}

macro_rules! impl_handlers {
    ($n:literal; $($idx:literal $ty:ident),*) => {
        impl<F, Fut, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: IntoMethodResult,
            $($ty: DeserializeOwned + Send + 'static,)*
        {
            type Output = Fut::Output;

            fn arg_types() -> Vec<ArgType> {
                vec![$(ArgType::of::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: Params) -> BoxFuture<'static, MethodResult> {
                let [$($ty,)*] = match <[Value; $n]>::try_from(args) {
                    Ok(values) => values,
                    Err(args) => return arity_mismatch($n, args.len()),
                };
                $(
                    let $ty = match decode::<$ty>($idx, $ty) {
                        Ok(v) => v,
                        Err(e) => return future::ready(MethodResult::err(e)).boxed(),
                    };
                )*
                finish((self)($($ty),*))
            }
        }

        impl<F, Fut, $($ty,)*> ContextHandler<($($ty,)*)> for F
        where
            F: Fn(CallContext, $($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: IntoMethodResult,
            $($ty: DeserializeOwned + Send + 'static,)*
        {
            type Output = Fut::Output;

            fn arg_types() -> Vec<ArgType> {
                vec![$(ArgType::of::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult> {
                let [$($ty,)*] = match <[Value; $n]>::try_from(args) {
                    Ok(values) => values,
                    Err(args) => return arity_mismatch($n, args.len()),
                };
                $(
                    let $ty = match decode::<$ty>($idx, $ty) {
                        Ok(v) => v,
                        Err(e) => return future::ready(MethodResult::err(e)).boxed(),
                    };
                )*
                finish((self)(ctx, $($ty),*))
            }
        }
    };
}

impl_handlers!(0;);
impl_handlers!(1; 0 A1);
impl_handlers!(2; 0 A1, 1 A2);
impl_handlers!(3; 0 A1, 1 A2, 2 A3);
impl_handlers!(4; 0 A1, 1 A2, 2 A3, 3 A4);
impl_handlers!(5; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5);
impl_handlers!(6; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5, 5 A6);
impl_handlers!(7; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5, 5 A6, 6 A7);
impl_handlers!(8; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5, 5 A6, 6 A7, 7 A8);

/// Type-erased invocation target.
trait ErasedHandler: Send + Sync + 'static {
    fn invoke(&self, ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult>;
}

struct Plain<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H: Handler<Args>, Args: 'static> ErasedHandler for Plain<H, Args> {
    fn invoke(&self, _ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult> {
        self.handler.invoke(args)
    }
}

struct WithContext<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H: ContextHandler<Args>, Args: 'static> ErasedHandler for WithContext<H, Args> {
    fn invoke(&self, ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult> {
        self.handler.invoke(ctx, args)
    }
}

/// A resolved, invocable representation of one registered method.
///
/// Immutable once built and cheap to clone; the registry and the dispatcher
/// share it through `Arc`.
#[derive(Clone)]
pub struct Callback {
    target: Arc<dyn ErasedHandler>,
    arg_types: Arc<[ArgType]>,
    has_context: bool,
    error_position: Option<usize>,
}

impl Callback {
    /// Wrap a handler that does not take a context.
    pub fn new<H, Args>(handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self {
            target: Arc::new(Plain {
                handler,
                _args: PhantomData,
            }),
            arg_types: H::arg_types().into(),
            has_context: false,
            error_position: <H::Output as IntoMethodResult>::error_position(),
        }
    }

    /// Wrap a handler whose first parameter is the call context.
    pub fn with_context<H, Args>(handler: H) -> Self
    where
        H: ContextHandler<Args>,
        Args: 'static,
    {
        Self {
            target: Arc::new(WithContext {
                handler,
                _args: PhantomData,
            }),
            arg_types: H::arg_types().into(),
            has_context: true,
            error_position: <H::Output as IntoMethodResult>::error_position(),
        }
    }

    /// Declared argument types, excluding the context slot.
    pub fn arg_types(&self) -> &[ArgType] {
        &self.arg_types
    }

    /// Whether the handler receives the call context.
    pub fn has_context(&self) -> bool {
        self.has_context
    }

    /// Which return slot carries the error, if any.
    pub fn error_position(&self) -> Option<usize> {
        self.error_position
    }

    /// Convert `args` to the declared types and invoke the target.
    ///
    /// `ctx` is passed on only if [`has_context`](Self::has_context) is set.
    /// Argument count or conversion failures come back as `invalid_params`
    /// errors inside the result.
    pub fn invoke(&self, ctx: CallContext, args: Params) -> BoxFuture<'static, MethodResult> {
        self.target.invoke(ctx, args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("arg_types", &self.arg_types)
            .field("has_context", &self.has_context)
            .field("error_position", &self.error_position)
            .finish_non_exhaustive()
    }
}
