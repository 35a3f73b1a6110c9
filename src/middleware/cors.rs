use http::Method;

use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::pipeline::Next;
use crate::response::{Body, Response};

const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
const WILDCARD: &str = "*";

/// Adds `Access-Control-Allow-*` headers to whatever the inner layers produced.
///
/// Runs `next` first, then rebuilds the response with its original headers
/// plus the CORS ones. Preflight (`OPTIONS`) requests are answered with an
/// empty `200` whatever the inner layers did. A `"*"` entry in any list allows
/// everything.
///
/// ```rust
/// use stackable::middleware::Cors;
///
/// let cors = Cors::new()
///     .allow_origin("https://app.example.com")
///     .allow_methods(["GET", "POST"])
///     .allow_headers(["content-type"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Cors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any origin, method and header.
    pub fn permissive() -> Self {
        Self::new()
            .allow_origin(WILDCARD)
            .allow_methods([WILDCARD])
            .allow_headers([WILDCARD])
    }

    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    pub fn allow_methods<I, T>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.allowed_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn allow_headers<I, T>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.allowed_headers.extend(headers.into_iter().map(Into::into));
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Value for a list header: `*` if the list holds it, the joined entries
    /// otherwise, nothing for an empty list.
    fn list_value(list: &[String]) -> Option<String> {
        if list.iter().any(|v| v == WILDCARD) {
            Some(WILDCARD.to_owned())
        } else if list.is_empty() {
            None
        } else {
            Some(list.join(", "))
        }
    }

    fn origin_value(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == WILDCARD) {
            return Some(WILDCARD.to_owned());
        }
        let origin = origin?;
        self.allowed_origins
            .iter()
            .any(|o| o == origin)
            .then(|| origin.to_owned())
    }
}

impl<S: 'static, L: 'static> Handler<S, L> for Cors {
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
        let result = next.run(ctx);

        let mut headers = ctx.response.headers().clone();
        if let Some(origin) = self.origin_value(ctx.request.header("origin")) {
            headers.add(ALLOW_ORIGIN, origin);
        }
        if let Some(allowed) = Self::list_value(&self.allowed_headers) {
            headers.add(ALLOW_HEADERS, allowed);
        }
        if let Some(allowed) = Self::list_value(&self.allowed_methods) {
            headers.add(ALLOW_METHODS, allowed);
        }
        if self.allow_credentials {
            headers.add(ALLOW_CREDENTIALS, "true");
        }

        ctx.response = if *ctx.request.method() == Method::OPTIONS {
            Response::from_parts(headers, 200, Body::empty())
        } else {
            std::mem::take(&mut ctx.response).with_headers(headers)
        };

        result
    }
}
