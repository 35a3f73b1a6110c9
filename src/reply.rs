//! The transport-facing side of a request: where the final response goes.

use std::io::{self, Write};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

/// A sink the pipeline writes the finished response into, exactly once per
/// request, in this order: headers, status, body.
///
/// The body goes through [`std::io::Write`], so a transport that streams can
/// forward bytes as they come instead of buffering.
pub trait Reply: Write {
    /// Drops every value currently stored under `name`.
    fn clear_header(&mut self, name: &str);

    fn add_header(&mut self, name: &str, value: &str) -> io::Result<()>;

    fn write_status(&mut self, status: u16) -> io::Result<()>;
}

/// Collects the reply in memory and converts it into an `http::Response`.
///
/// Header names are folded to lowercase by `http`, so `Content-Type` and
/// `content-type` land in the same slot. Until a status is written the reply
/// reports `500`.
#[derive(Debug)]
pub struct BufferedReply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedReply {
    pub fn new() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut resp = http::Response::new(Full::new(Bytes::from(self.body)));
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

impl Default for BufferedReply {
    fn default() -> Self { Self::new() }
}

fn invalid(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

impl Reply for BufferedReply {
    fn clear_header(&mut self, name: &str) {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            self.headers.remove(name);
        }
    }

    fn add_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(invalid)?;
        let value = HeaderValue::from_str(value).map_err(invalid)?;
        self.headers.append(name, value);
        Ok(())
    }

    fn write_status(&mut self, status: u16) -> io::Result<()> {
        self.status = StatusCode::from_u16(status).map_err(invalid)?;
        Ok(())
    }
}

impl Write for BufferedReply {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
