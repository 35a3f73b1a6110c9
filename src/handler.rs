//! Handler trait and the function adapter.
//!
//! # How layers are stored
//!
//! A [`Pipeline`](crate::Pipeline) holds handlers of *different* concrete
//! types in one `Vec`. Rust collections hold one type, so every handler is
//! put behind a trait object (`Arc<dyn Handler<S, L>>`) when it is added.
//!
//! ```text
//! struct Auth { .. }  /  handler_fn(|ctx, next| ..)    ← user writes this
//!        ↓ pipeline.add_handler(auth)
//! Arc::new(auth) as Arc<dyn Handler<S, L>>             ← one allocation, at startup
//!        ↓ per request
//! handler.run(&mut ctx, next)                          ← one vtable dispatch per layer
//! ```
//!
//! `Arc` rather than `Box` because forking a pipeline with
//! [`Pipeline::with_handler`](crate::Pipeline::with_handler) copies the
//! handler *references*, not the handlers: a layer with internal state (a
//! counter, a connection pool) stays a single instance across every fork.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::pipeline::Next;

/// A type-erased handler shared by every pipeline it was added to.
pub type BoxedHandler<S, L> = Arc<dyn Handler<S, L>>;

/// One layer of the onion.
///
/// `run` receives the request's [`Context`] and the continuation `next`.
/// Code before `next.run(ctx)` sees the request on its way in; code after it
/// sees the response the inner layers produced. Not calling `next` at all
/// short-circuits the rest of the chain.
///
/// ```rust
/// use stackable::{Context, Error, Handler, HttpError, Next};
///
/// struct RequireToken {
///     token: String,
/// }
///
/// impl<S: 'static, L: 'static> Handler<S, L> for RequireToken {
///     fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
///         match ctx.request.header("authorization") {
///             Some(value) if value == self.token => next.run(ctx),
///             _ => Err(HttpError::new(401, "missing or invalid token").into()),
///         }
///     }
/// }
/// ```
///
/// Pipelines store handlers as `'static` trait objects, so a handler generic
/// over the state types needs `S: 'static, L: 'static` on its impl, as above.
///
/// Returning an error does not write anything to the client by itself; pair
/// it with an error-mapping layer placed earlier in the pipeline.
pub trait Handler<S, L>: Send + Sync + 'static {
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error>;
}

// ── Function adapter ──────────────────────────────────────────────────────────

/// Lets a plain function or closure act as a [`Handler`].
///
/// Built by [`handler_fn`]. The `PhantomData` pins the state types the
/// function was written for; it stores nothing.
pub struct FnHandler<F, S, L> {
    f: F,
    _state: PhantomData<fn(&S, L)>,
}

/// Wraps `f` so it can be added to a pipeline.
///
/// ```rust
/// use stackable::{Pipeline, Response, handler_fn};
///
/// let mut pipeline: Pipeline<(), ()> = Pipeline::new(());
/// pipeline.add_handler(handler_fn(|ctx, next| {
///     ctx.response = Response::text(200, "hi");
///     next.run(ctx)
/// }));
/// ```
pub fn handler_fn<S, L, F>(f: F) -> FnHandler<F, S, L>
where
    F: Fn(&mut Context<'_, S, L>, Next<'_, S, L>) -> Result<(), Error> + Send + Sync + 'static,
{
    FnHandler { f, _state: PhantomData }
}

impl<F, S, L> Handler<S, L> for FnHandler<F, S, L>
where
    F: Fn(&mut Context<'_, S, L>, Next<'_, S, L>) -> Result<(), Error> + Send + Sync + 'static,
    S: 'static,
    L: 'static,
{
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
        (self.f)(ctx, next)
    }
}

impl<F, S, L> fmt::Debug for FnHandler<F, S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
