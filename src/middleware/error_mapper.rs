use crate::context::Context;
use crate::error::{Error, HttpError};
use crate::handler::Handler;
use crate::pipeline::Next;
use crate::response::Response;

const INTERNAL_SERVER_ERROR: u16 = 500;

/// Turns errors from the inner layers into JSON responses.
///
/// An [`HttpError`] keeps its status; any other error becomes a `500` carrying
/// the error's text. The body is `{"status": .., "message": ..}`. The error is
/// consumed: layers outside this one see `Ok(())`.
///
/// If the body cannot be serialised, a `text/plain` response carrying the
/// serialisation error is written and that error is returned, so the
/// pipeline's logger reports it.
///
/// Put it early in the pipeline so it wraps every layer that may fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper;

impl ErrorMapper {
    fn to_http(err: Error) -> HttpError {
        match err {
            Error::Http(e) => e,
            other => HttpError::new(INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl<S: 'static, L: 'static> Handler<S, L> for ErrorMapper {
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
        let Err(err) = next.run(ctx) else {
            return Ok(());
        };

        let err = Self::to_http(err);
        match Response::json(err.status, &err) {
            Ok(resp) => {
                ctx.response = resp;
                Ok(())
            }
            Err(fallback) => {
                ctx.response = Response::text(fallback.status, fallback.message.clone());
                Err(fallback.into())
            }
        }
    }
}
