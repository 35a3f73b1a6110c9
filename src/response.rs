//! The in-flight response value and its body.
//!
//! A [`Response`] is never patched in place by a layer. Layers build a new
//! value and assign it into [`Context::response`](crate::Context::response);
//! whatever sits there when the chain returns is what the client receives.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::error::HttpError;
use crate::headers::Headers;

/// Header name used by the typed constructors.
pub const CONTENT_TYPE: &str = "Content-Type";

const PLACEHOLDER_STATUS: u16 = 500;
const PLACEHOLDER_BODY: &str = "Override this response from your handlers!";

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`Response::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        ct.as_str().to_owned()
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// A fresh, independent reader over a [`Body`].
pub type BodyReader = Box<dyn Read + Send>;

type ReaderFactory = Arc<dyn Fn() -> io::Result<BodyReader> + Send + Sync>;

/// Response content.
///
/// Both representations are re-readable: every call to [`Body::reader`]
/// starts again from the first byte.
///
/// - **Buffered** ([`Bytes`]): the default. Cloning is a reference-count bump.
/// - **Streamed**: a factory that opens a new stream per read, for bodies too
///   large to hold in memory (files, generated exports).
#[derive(Clone)]
pub struct Body {
    kind: BodyKind,
}

#[derive(Clone)]
enum BodyKind {
    Buffered(Bytes),
    Streamed(ReaderFactory),
}

impl Body {
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// A body produced by `open`, which is called once per read.
    ///
    /// ```rust
    /// use std::io::Cursor;
    /// use stackable::Body;
    ///
    /// let body = Body::from_reader_fn(|| Ok(Box::new(Cursor::new(b"chunk".to_vec()))));
    /// assert_eq!(body.to_bytes().unwrap(), "chunk");
    /// assert_eq!(body.to_bytes().unwrap(), "chunk");
    /// ```
    pub fn from_reader_fn<F>(open: F) -> Self
    where
        F: Fn() -> io::Result<BodyReader> + Send + Sync + 'static,
    {
        Self { kind: BodyKind::Streamed(Arc::new(open)) }
    }

    /// Opens a new reader positioned at the start of the content.
    pub fn reader(&self) -> io::Result<BodyReader> {
        match &self.kind {
            BodyKind::Buffered(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            BodyKind::Streamed(open) => open(),
        }
    }

    /// Reads the whole body into memory.
    pub fn to_bytes(&self) -> io::Result<Bytes> {
        match &self.kind {
            BodyKind::Buffered(bytes) => Ok(bytes.clone()),
            BodyKind::Streamed(_) => {
                let mut buf = Vec::new();
                self.reader()?.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Length in bytes, when known without reading.
    pub fn len_hint(&self) -> Option<usize> {
        match &self.kind {
            BodyKind::Buffered(bytes) => Some(bytes.len()),
            BodyKind::Streamed(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BodyKind::Buffered(bytes) => f.debug_tuple("Buffered").field(bytes).finish(),
            BodyKind::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self { kind: BodyKind::Buffered(bytes) }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A complete response snapshot: status, headers and body.
///
/// ```rust
/// use stackable::{ContentType, Response};
///
/// let resp = Response::new(201, ContentType::Json, r#"{"id":42}"#);
/// assert_eq!(resp.status(), 201);
/// assert_eq!(resp.headers().get("Content-Type"), ["application/json"]);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Response whose headers hold a single `Content-Type` entry.
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Body>) -> Self {
        let mut headers = Headers::new();
        headers.set(CONTENT_TYPE, content_type);
        Self { status, headers, body: body.into() }
    }

    /// Raw form: the caller supplies the full header container.
    ///
    /// Used by layers that keep the downstream headers and add their own on
    /// top, such as [`Cors`](crate::middleware::Cors).
    pub fn from_parts(headers: Headers, status: u16, body: impl Into<Body>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// `application/json` response with `value` serialised by serde.
    ///
    /// A serialisation failure comes back as a `500` [`HttpError`]. Nothing is
    /// logged here; a handler returning it lets the pipeline's logger report it.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self, HttpError> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            HttpError::new(PLACEHOLDER_STATUS, format!("Failed to serialise JSON. Error: {e}"))
        })?;
        Ok(Self::new(status, ContentType::Json, bytes))
    }

    /// `text/plain` response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, ContentType::Text, body.into())
    }

    /// Same status and body, different headers.
    pub fn with_headers(self, headers: Headers) -> Self {
        Self { headers, ..self }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The body. Each call to [`Body::reader`] on it yields the full content.
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_parts(self) -> (Headers, u16, Body) {
        (self.headers, self.status, self.body)
    }
}

/// The value every request starts with.
///
/// A pipeline whose handlers never assign a response answers with this.
impl Default for Response {
    fn default() -> Self {
        Self::new(PLACEHOLDER_STATUS, ContentType::Html, PLACEHOLDER_BODY)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Collects whatever a `fmt` subscriber writes.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn read_all(body: &Body) -> String {
        let mut out = String::new();
        body.reader().unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn new_sets_single_content_type() {
        let resp = Response::new(200, "text/html", "<h1>hi</h1>");

        assert_eq!(resp.headers().len(), 1);
        assert_eq!(resp.headers().get(CONTENT_TYPE), ["text/html"]);
    }

    #[test]
    fn body_can_be_read_twice() {
        let resp = Response::text(200, "hello");

        assert_eq!(read_all(resp.body()), "hello");
        assert_eq!(read_all(resp.body()), "hello");
    }

    #[test]
    fn streamed_body_reopens_per_read() {
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&opened);
        let body = Body::from_reader_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Cursor::new(b"large".to_vec())))
        });
        let resp = Response::from_parts(Headers::new(), 200, body);

        assert_eq!(read_all(resp.body()), "large");
        assert_eq!(read_all(resp.body()), "large");
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(resp.body().len_hint(), None);
    }

    #[test]
    fn default_is_the_placeholder() {
        let resp = Response::default();

        assert_eq!(resp.status(), 500);
        assert_eq!(resp.headers().get(CONTENT_TYPE), ["text/html"]);
        assert_eq!(read_all(resp.body()), PLACEHOLDER_BODY);
    }

    #[test]
    fn with_headers_keeps_status_and_body() {
        let resp = Response::text(404, "missing");
        let mut headers = resp.headers().clone();
        headers.add("Cache-Control", "no-store");

        let swapped = resp.with_headers(headers);

        assert_eq!(swapped.status(), 404);
        assert_eq!(swapped.headers().get("Cache-Control"), ["no-store"]);
        assert_eq!(read_all(swapped.body()), "missing");
    }

    #[test]
    fn json_serialises_value() {
        let resp = Response::json(418, &HttpError::new(418, "teapot")).unwrap();

        assert_eq!(resp.status(), 418);
        assert_eq!(resp.headers().get(CONTENT_TYPE), ["application/json"]);
        assert_eq!(read_all(resp.body()), r#"{"status":418,"message":"teapot"}"#);
    }

    #[test]
    fn json_failure_becomes_http_error() {
        use std::collections::HashMap;

        // Non-string map keys cannot be represented in JSON.
        let mut bad = HashMap::new();
        bad.insert((1, 2), "x");

        let err = Response::json(200, &bad).unwrap_err();
        assert_eq!(err.status, 500);
        assert!(err.message.starts_with("Failed to serialise JSON"));
    }

    #[test]
    fn json_failure_emits_no_event() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(captured.clone())
            .finish();

        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "x");
        let result = tracing::subscriber::with_default(subscriber, || Response::json(200, &bad));

        assert!(result.is_err());
        assert!(captured.0.lock().unwrap().is_empty());
    }
}
