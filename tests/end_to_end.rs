//! End-to-end behaviour of a pipeline, from request to materialised reply.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use stackable::middleware::ErrorMapper;
use stackable::{
    BufferedReply, Context, Error, Handler, HttpError, Next, Pipeline, Request, Response,
};

/// Sets a fixed text response and continues.
struct SetStatus {
    status: u16,
    body: &'static str,
}

impl<S: 'static, L: 'static> Handler<S, L> for SetStatus {
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
        ctx.response = Response::text(self.status, self.body);
        next.run(ctx)
    }
}

/// Always fails with the configured domain error.
struct AlwaysFail(HttpError);

impl<S: 'static, L: 'static> Handler<S, L> for AlwaysFail {
    fn run(&self, _ctx: &mut Context<'_, S, L>, _next: Next<'_, S, L>) -> Result<(), Error> {
        Err(self.0.clone().into())
    }
}

#[derive(Default)]
struct Counter {
    requests: AtomicU64,
}

struct CountRequests;

impl<L: 'static> Handler<Counter, L> for CountRequests {
    fn run(&self, ctx: &mut Context<'_, Counter, L>, next: Next<'_, Counter, L>) -> Result<(), Error> {
        ctx.shared.requests.fetch_add(1, Ordering::SeqCst);
        next.run(ctx)
    }
}

fn get(path: &str) -> Request {
    Request::new(Method::GET, path)
}

/// `Full` resolves on first poll, so a throwaway runtime is enough.
fn body_string(resp: http::Response<Full<Bytes>>) -> String {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let bytes = rt.block_on(resp.into_body().collect()).unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test]
fn set_status_reaches_the_transport() {
    let mut pipeline: Pipeline<(), ()> = Pipeline::new(());
    pipeline.add_handler(SetStatus { status: 200, body: "hi" });

    let resp = pipeline.serve_http(&get("/"));

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(body_string(resp), "hi");
}

#[test]
fn error_mapper_answers_domain_errors() {
    let mut pipeline: Pipeline<(), ()> = Pipeline::new(());
    pipeline
        .add_handler(ErrorMapper)
        .add_handler(AlwaysFail(HttpError::new(418, "teapot")));

    let outcome = pipeline.execute(&get("/"));
    assert!(outcome.result.is_ok());

    let resp = pipeline.serve_http(&get("/"));
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_string(resp).contains("teapot"));
}

#[test]
fn unmapped_error_writes_the_placeholder() {
    let mut pipeline: Pipeline<(), ()> = Pipeline::new(());
    pipeline.add_handler(AlwaysFail(HttpError::new(403, "forbidden")));

    let mut reply = BufferedReply::new();
    pipeline.handle(&get("/"), &mut reply);

    assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.headers()["content-type"], "text/html");
    assert_eq!(reply.body(), b"Override this response from your handlers!");
}

#[test]
fn concurrent_requests_do_not_lose_updates() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 250;

    let mut pipeline: Pipeline<Counter, ()> = Pipeline::new(Counter::default());
    pipeline
        .add_handler(CountRequests)
        .add_handler(SetStatus { status: 204, body: "" });
    let pipeline = Arc::new(pipeline);

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    let resp = pipeline.serve_http(&get("/"));
                    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(pipeline.shared().requests.load(Ordering::SeqCst), THREADS * PER_THREAD);
}

#[test]
fn route_variants_share_base_state() {
    let mut base: Pipeline<Counter, ()> = Pipeline::new(Counter::default());
    base.add_handler(CountRequests).add_handler(ErrorMapper);

    let index = base.with_handler(SetStatus { status: 200, body: "index" });
    let teapot = base.with_handler(AlwaysFail(HttpError::new(418, "teapot")));

    assert_eq!(body_string(index.serve_http(&get("/"))), "index");
    assert_eq!(teapot.serve_http(&get("/teapot")).status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(base.serve_http(&get("/")).status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(base.len(), 2);
    assert_eq!(base.shared().requests.load(Ordering::SeqCst), 3);
}
