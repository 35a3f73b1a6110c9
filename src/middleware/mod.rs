//! Ready-made layers.
//!
//! None of these are special to the pipeline. Each is an ordinary
//! [`Handler`](crate::Handler) and doubles as an example of one of the three
//! shapes a layer usually takes:
//!
//! - [`RequestId`]: works *before* `next` (stamps the request, then delegates)
//! - [`ErrorMapper`]: works *after* `next` (inspects what the inner layers
//!   returned)
//! - [`Cors`]: works after `next` *on the response* (rebuilds it with extra
//!   headers)

mod cors;
mod error_mapper;
mod request_id;

pub use cors::Cors;
pub use error_mapper::ErrorMapper;
pub use request_id::{HasRequestId, RequestId};
