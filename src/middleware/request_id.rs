use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::pipeline::Next;

/// Local state that can carry a request id.
pub trait HasRequestId {
    fn request_id(&self) -> u64;
    fn set_request_id(&mut self, id: u64);
}

/// Stamps every request with an id from a counter starting at 0.
///
/// The counter lives in the layer, so every pipeline forked from the one it
/// was added to draws from the same sequence.
#[derive(Debug, Default)]
pub struct RequestId {
    counter: AtomicU64,
}

impl RequestId {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter starting at `first` instead of 0.
    pub fn starting_at(first: u64) -> Self {
        Self { counter: AtomicU64::new(first) }
    }
}

impl<S: 'static, L: HasRequestId + 'static> Handler<S, L> for RequestId {
    fn run(&self, ctx: &mut Context<'_, S, L>, next: Next<'_, S, L>) -> Result<(), Error> {
        ctx.local.set_request_id(self.counter.fetch_add(1, Ordering::Relaxed));
        next.run(ctx)
    }
}
