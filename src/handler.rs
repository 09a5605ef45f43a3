//! Handler trait, type erasure, and the [`Endpoint`] seam middleware plugs into.
//!
//! # How async handlers are stored
//!
//! The router keeps handlers of *different* concrete types in one map, so
//! each is hidden behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! Arc::new(FnHandler(hello))                       ← BoxedHandler
//!        ↓ at request time
//! Box::pin(async { hello(req).await.into_response() })
//! ```
//!
//! Per request that costs one `Arc` clone and one virtual call.
//!
//! # Endpoints
//!
//! Handlers produce a [`Response`]. An [`Endpoint`] is one level lower: it
//! gets the request *and* the response sink, and is responsible for writing
//! into it. [`Router`](crate::Router) is the endpoint that turns handler
//! output into sink writes; [`AccessLog`](crate::middleware::AccessLog) is
//! an endpoint that wraps another one.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::writer::ResponseWriter;

/// A heap-allocated, type-erased, `Send` future.
///
/// `Pin<Box<…>>` because the runtime polls it in place; `Send` so tokio can
/// move the request task between worker threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// Something that serves a request by writing into a response sink.
///
/// Implemented by [`Router`](crate::Router) and by every middleware, which
/// lets middleware nest: `AccessLog::new(router, sink)` is itself an
/// `Endpoint` and can be handed straight to [`Server::serve`](crate::Server::serve).
pub trait Endpoint: Send + Sync + 'static {
    fn serve<'a>(&'a self, req: Request, res: &'a mut dyn ResponseWriter) -> BoxFuture<'a, ()>;
}

impl<E: Endpoint + ?Sized> Endpoint for Arc<E> {
    fn serve<'a>(&'a self, req: Request, res: &'a mut dyn ResponseWriter) -> BoxFuture<'a, ()> {
        (**self).serve(req, res)
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn`
/// (or closure returning a future) with the shape:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// Sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
