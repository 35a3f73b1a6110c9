//! The pipeline: an ordered handler list bound to one shared state.
//!
//! # Onion order
//!
//! Handlers run in the order they were added, first-added outermost:
//!
//! ```text
//! request ──▶ A ─▶ B ─▶ C ┐
//!                         │  (C's next.run is a no-op returning Ok)
//! reply   ◀── A ◀─ B ◀─ C ┘
//! ```
//!
//! # The continuation cursor
//!
//! [`Next`] is a cursor, not a pre-built closure tree. It holds the handler
//! slice and a shared index of the next handler to run. `Next::run` reads the
//! index, bumps it and runs that handler, passing the same cursor along. Once
//! the index is past the end, `run` returns `Ok(())`.
//!
//! Because the index is shared by the whole chain, every call to `next.run`
//! resolves to the next handler *not yet run*, even if a handler calls it
//! twice.

use std::cell::Cell;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use tracing::level_filters::LevelFilter;

use crate::config::PipelineConfig;
use crate::context::{Context, LocalState};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::logger::Logger;
use crate::reply::{BufferedReply, Reply};
use crate::request::Request;
use crate::response::Response;

// ── Next ──────────────────────────────────────────────────────────────────────

/// The continuation handed to every [`Handler::run`].
pub struct Next<'a, S, L> {
    handlers: &'a [BoxedHandler<S, L>],
    cursor: &'a Cell<usize>,
}

impl<S, L> Clone for Next<'_, S, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, L> Copy for Next<'_, S, L> {}

impl<'a, S: 'static, L: 'static> Next<'a, S, L> {
    /// Runs the rest of the chain.
    pub fn run(self, ctx: &mut Context<'_, S, L>) -> Result<(), Error> {
        let index = self.cursor.get();
        let Some(handler) = self.handlers.get(index) else {
            return Ok(());
        };
        self.cursor.set(index + 1);
        handler.run(ctx, self)
    }

    /// Number of handlers that have not started yet.
    pub fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.cursor.get())
    }
}

impl<S, L> fmt::Debug for Next<'_, S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("cursor", &self.cursor.get())
            .field("len", &self.handlers.len())
            .finish()
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Terminal state of one run of the chain.
#[derive(Debug)]
pub struct Outcome<L> {
    /// Whatever was assigned to `ctx.response` last; the placeholder if
    /// nothing was.
    pub response: Response,
    pub local: L,
    /// What the outermost handler returned.
    pub result: Result<(), Error>,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// An ordered list of handlers sharing one `S`, building a fresh `L` per
/// request.
///
/// ```rust
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use stackable::{Pipeline, Request, Response, handler_fn};
/// use http::Method;
///
/// #[derive(Default)]
/// struct Shared {
///     hits: AtomicU64,
/// }
///
/// let mut base: Pipeline<Shared, ()> = Pipeline::new(Shared::default());
/// base.add_handler(handler_fn::<Shared, (), _>(|ctx, next| {
///     ctx.shared.hits.fetch_add(1, Ordering::Relaxed);
///     next.run(ctx)
/// }));
///
/// // A route-specific variant; `base` is left untouched.
/// let index = base.with_handler(handler_fn(|ctx, _next| {
///     ctx.response = Response::text(200, "index");
///     Ok(())
/// }));
///
/// let reply = index.serve_http(&Request::new(Method::GET, "/"));
/// assert_eq!(reply.status(), 200);
/// assert_eq!(base.len(), 1);
/// assert_eq!(base.shared().hits.load(Ordering::Relaxed), 1);
/// ```
pub struct Pipeline<S, L> {
    handlers: Vec<BoxedHandler<S, L>>,
    shared: Arc<S>,
    logger: Logger,
}

impl<S, L> Pipeline<S, L>
where
    S: Send + Sync + 'static,
    L: LocalState,
{
    pub fn new(shared: S) -> Self {
        Self::with_config(Arc::new(shared), PipelineConfig::default())
    }

    /// Binds the pipeline to an `S` the caller keeps a handle on.
    pub fn from_shared(shared: Arc<S>) -> Self {
        Self::with_config(shared, PipelineConfig::default())
    }

    pub fn with_config(shared: Arc<S>, config: PipelineConfig) -> Self {
        Self { handlers: Vec::new(), shared, logger: Logger::new(config) }
    }

    pub fn shared(&self) -> &Arc<S> {
        &self.shared
    }

    pub fn handlers(&self) -> &[BoxedHandler<S, L>] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn set_log_level(&mut self, level: LevelFilter) -> &mut Self {
        self.logger.set_level(level);
        self
    }

    /// Appends `handler` to this pipeline.
    pub fn add_handler(&mut self, handler: impl Handler<S, L>) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Copy-on-extend: a new pipeline with this one's handlers followed by
    /// `handler`.
    ///
    /// The new list is independently allocated, so later additions to either
    /// pipeline never show up in the other. Shared state, logger settings
    /// and the existing handler instances are shared.
    pub fn with_handler(&self, handler: impl Handler<S, L>) -> Self {
        let mut handlers = Vec::with_capacity(self.handlers.len() + 1);
        handlers.extend(self.handlers.iter().cloned());
        handlers.push(Arc::new(handler) as BoxedHandler<S, L>);

        Self { handlers, shared: Arc::clone(&self.shared), logger: self.logger }
    }

    /// Runs the chain for `request` and returns its terminal state without
    /// writing anything.
    pub fn execute(&self, request: &Request) -> Outcome<L> {
        let mut ctx = Context::new(&*self.shared, request);
        let cursor = Cell::new(0);
        let next = Next { handlers: &self.handlers, cursor: &cursor };

        let result = next.run(&mut ctx);

        Outcome { response: ctx.response, local: ctx.local, result }
    }

    /// Runs the chain and writes the final response into `reply`.
    ///
    /// A chain error is logged and otherwise ignored: the response currently
    /// in the context is written regardless. Write failures are logged and
    /// end the request.
    ///
    /// Every header key is cleared on `reply` before its values are added. On
    /// a case-insensitive sink, keys that differ only by case therefore do not
    /// merge: the last one written wins.
    pub fn handle<R: Reply + ?Sized>(&self, request: &Request, reply: &mut R) {
        let started = Instant::now();

        let outcome = self.execute(request);
        if let Err(e) = &outcome.result {
            self.logger.chain_failed(e);
        }

        self.materialize(&outcome.response, reply);

        self.logger.handled(
            request.method(),
            request.path(),
            outcome.response.status(),
            started.elapsed(),
        );
    }

    /// [`handle`](Self::handle) into a buffered `http::Response`, ready for hyper.
    pub fn serve_http(&self, request: &Request) -> http::Response<Full<Bytes>> {
        let mut reply = BufferedReply::new();
        self.handle(request, &mut reply);
        reply.into_http()
    }

    /// Headers first (each key cleared, then every value added), then the
    /// status, then the body.
    fn materialize<R: Reply + ?Sized>(&self, response: &Response, reply: &mut R) {
        for (name, values) in response.headers().entries() {
            reply.clear_header(name);
            for value in values {
                if let Err(e) = reply.add_header(name, value) {
                    self.logger.write_failed("header", &e);
                }
            }
        }

        if let Err(e) = reply.write_status(response.status()) {
            self.logger.write_failed("status", &e);
            return;
        }

        if let Err(e) = copy_body(response, reply) {
            self.logger.write_failed("body", &e);
        }
    }
}

fn copy_body<R: Reply + ?Sized>(response: &Response, reply: &mut R) -> io::Result<()> {
    let mut reader = response.body().reader()?;
    io::copy(&mut reader, reply)?;
    reply.flush()
}

impl<S, L> Clone for Pipeline<S, L> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            shared: Arc::clone(&self.shared),
            logger: self.logger,
        }
    }
}

impl<S, L> fmt::Debug for Pipeline<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("handlers", &self.handlers.len())
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
