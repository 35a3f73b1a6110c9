//! # stackable
//!
//! Onion-style middleware stacks for HTTP services, with typed state.
//!
//! A [`Pipeline`] is an ordered list of [`Handler`]s. Each request walks it
//! from the first-added handler inwards and unwinds back out, every layer
//! getting one shot before and one after the rest of the chain:
//!
//! ```text
//! ──▶ RequestId ──▶ ErrorMapper ──▶ Auth ──▶ Route ┐
//! ◀── RequestId ◀── ErrorMapper ◀── Auth ◀── Route ┘
//! ```
//!
//! ## Two kinds of state
//!
//! - **Shared** (`S`): one instance per pipeline, seen by every request at
//!   once. Database pools, counters, caches. `S` synchronises itself
//!   (atomics, `Mutex`, ...); the pipeline only hands out `&S`.
//! - **Local** (`L`): a fresh value per request, built by
//!   [`LocalState::initial`] (any `Default` type). The authenticated user, a
//!   request id, timings. Never shared, never locked.
//!
//! ## What stackable is not
//!
//! No router, no templates, no persistence. Build route-specific stacks with
//! [`Pipeline::with_handler`] and dispatch to them however you like.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use stackable::middleware::{ErrorMapper, HasRequestId, RequestId};
//! use stackable::{HttpError, Pipeline, Response, Server, handler_fn};
//!
//! #[derive(Default)]
//! struct Shared {
//!     served: AtomicU64,
//! }
//!
//! #[derive(Default)]
//! struct Local {
//!     request_id: u64,
//! }
//!
//! impl HasRequestId for Local {
//!     fn request_id(&self) -> u64 { self.request_id }
//!     fn set_request_id(&mut self, id: u64) { self.request_id = id; }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stackable::Error> {
//!     let mut app: Pipeline<Shared, Local> = Pipeline::new(Shared::default());
//!     app.add_handler(RequestId::new())
//!         .add_handler(ErrorMapper)
//!         .add_handler(handler_fn::<Shared, Local, _>(|ctx, next| {
//!             if ctx.request.path() == "/teapot" {
//!                 return Err(HttpError::new(418, "I am a teapot").into());
//!             }
//!             let n = ctx.shared.served.fetch_add(1, Ordering::Relaxed);
//!             ctx.response = Response::text(200, format!("request #{} ({n} served)", ctx.local.request_id));
//!             next.run(ctx)
//!         }));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//! ```

mod config;
mod context;
mod duration;
mod error;
mod handler;
mod headers;
mod logger;
mod pipeline;
mod reply;
mod request;
mod response;
mod server;

pub mod middleware;

pub use config::{Config, ConfigError, PipelineConfig, ServerConfig};
pub use context::{Context, LocalState};
pub use duration::format_duration;
pub use error::{Error, HttpError};
pub use handler::{BoxedHandler, FnHandler, Handler, handler_fn};
pub use headers::{Entries, Headers};
pub use logger::Logger;
pub use pipeline::{Next, Outcome, Pipeline};
pub use reply::{BufferedReply, Reply};
pub use request::Request;
pub use response::{Body, BodyReader, CONTENT_TYPE, ContentType, Response};
pub use server::{Server, serve_with_shutdown};
