//! Per-request execution context and the local-state contract.

use crate::request::Request;
use crate::response::Response;

/// Capability of a per-request state type to produce its initial value.
///
/// Called once at the start of every request. Any `Default` type qualifies,
/// so in practice you derive `Default` and are done:
///
/// ```rust
/// #[derive(Default)]
/// struct Local {
///     user_id: Option<u64>,
/// }
/// ```
///
/// A type without it cannot be used as a pipeline's local state; the
/// mistake is a compile error, never a runtime one.
pub trait LocalState: Send + 'static {
    fn initial() -> Self;
}

impl<T: Default + Send + 'static> LocalState for T {
    fn initial() -> Self {
        T::default()
    }
}

/// Everything a handler can see and touch while a request is in flight.
///
/// One context exists per request. Every handler in the chain receives the
/// same `&mut` to it, so a value written by an outer layer before calling
/// [`Next::run`](crate::Next::run) is visible to the inner layers, and a
/// response assigned by an inner layer is visible to the outer ones after it
/// returns.
pub struct Context<'a, S, L> {
    /// State shared by every request of the pipeline. `S` must do its own
    /// synchronisation; the pipeline only hands out `&S`.
    pub shared: &'a S,
    /// State owned by this request alone.
    pub local: L,
    /// The response written to the client once the chain returns.
    pub response: Response,
    pub request: &'a Request,
}

impl<'a, S, L: LocalState> Context<'a, S, L> {
    /// Fresh context: initial local state and the placeholder response.
    pub fn new(shared: &'a S, request: &'a Request) -> Self {
        Self {
            shared,
            local: L::initial(),
            response: Response::default(),
            request,
        }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    #[derive(Default)]
    struct Local {
        hits: u32,
    }

    #[test]
    fn new_context_starts_from_initial_values() {
        let req = Request::new(Method::GET, "/");
        let ctx: Context<'_, (), Local> = Context::new(&(), &req);

        assert_eq!(ctx.local.hits, 0);
        assert_eq!(ctx.response.status(), 500);
        assert_eq!(ctx.request.path(), "/");
    }
}
