//! Minimal stackable example: shared counter, per-request id, error mapping,
//! CORS and two route variants derived from one base stack.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -i http://localhost:3001/
//!   curl -i -X OPTIONS http://localhost:3000/ -H 'origin: https://example.com'

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use stackable::middleware::{Cors, ErrorMapper, HasRequestId, RequestId};
use stackable::{
    Config, Context, ContentType, Error, Handler, HttpError, Next, Pipeline, Response, Server,
    handler_fn,
};
use tracing::info;

// Every handler sees the same Shared; put pools, caches and counters here.
#[derive(Default)]
struct Shared {
    served: AtomicU64,
}

// A fresh Local per request.
#[derive(Default)]
struct Local {
    request_id: u64,
}

impl HasRequestId for Local {
    fn request_id(&self) -> u64 { self.request_id }
    fn set_request_id(&mut self, id: u64) { self.request_id = id; }
}

type App = Pipeline<Shared, Local>;

/// Logs the final status after the inner layers ran.
struct AccessLog {
    tag: &'static str,
}

impl Handler<Shared, Local> for AccessLog {
    fn run(&self, ctx: &mut Context<'_, Shared, Local>, next: Next<'_, Shared, Local>) -> Result<(), Error> {
        let result = next.run(ctx);
        info!(
            tag = self.tag,
            rid = ctx.local.request_id,
            peer = ?ctx.request.remote_addr(),
            "{} - {} {}",
            ctx.response.status(),
            ctx.request.method(),
            ctx.request.path(),
        );
        result
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Config::from_toml_str(
        r#"
        [server]
        addr = "0.0.0.0:3000"

        [pipeline]
        level = "debug"
        "#,
    )?;

    // The teapot variant listens on the next port up.
    let mut teapot_server = config.server.clone();
    teapot_server.addr.set_port(config.server.addr.port() + 1);

    let mut base = App::with_config(Arc::default(), config.pipeline);
    base.add_handler(Cors::permissive())
        .add_handler(RequestId::new())
        .add_handler(ErrorMapper);

    // Two variants of the same base stack; `base` itself is not modified.
    let index = base
        .with_handler(AccessLog { tag: "index" })
        .with_handler(handler_fn::<Shared, Local, _>(|ctx, next| {
            let n = ctx.shared.served.fetch_add(1, Ordering::Relaxed);
            ctx.response = Response::new(
                200,
                ContentType::Html,
                format!("<h1>Index route!</h1><p>request {} of {}</p>", ctx.local.request_id, n + 1),
            );
            next.run(ctx)
        }));

    let teapot = base
        .with_handler(AccessLog { tag: "error" })
        .with_handler(handler_fn::<Shared, Local, _>(|_ctx, _next| {
            Err(HttpError::new(418, "I AM A TEAPOT").into())
        }));

    // No router: each variant gets its own listener.
    tokio::try_join!(
        Server::from_config(&config.server).serve(index),
        Server::from_config(&teapot_server).serve(teapot),
    )?;
    Ok(())
}
