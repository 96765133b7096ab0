//! Middleware pipeline around the terminal transport call
//!
//! A middleware wraps the rest of the chain through a [`Next`] handle: it
//! may mutate the request before dispatching inward, inspect the outcome
//! after, or skip `next` entirely and short-circuit with its own result.
//! The first-registered middleware is the outermost wrapper: it sees the
//! request first and the result last.
//!
//! The chain itself is immutable after client construction, holds no
//! per-call state, and performs no retries, timeouts or logging. Anything
//! stateful belongs in the middleware struct, configured up front.

pub mod hooks;
pub mod retry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::request::FinalizedRequest;
use crate::response::Response;
use crate::transport::Transport;

pub use hooks::Hooks;
pub use retry::{Retrier, RetryPolicy};

/// An interceptor around the terminal network call.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handle `request`, dispatching inward through `next` as needed.
    async fn handle(&self, request: FinalizedRequest, next: Next<'_>) -> Result<Response>;
}

/// Handle to the remainder of the chain plus the terminal transport call.
///
/// `Next` is `Copy`, so a middleware may dispatch more than once (the retry
/// middleware does exactly that).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Dispatch `request` to the next middleware, or to the transport when
    /// the chain is exhausted.
    pub async fn run(self, request: FinalizedRequest) -> Result<Response> {
        match self.chain.split_first() {
            Some((current, rest)) => {
                current
                    .handle(
                        request,
                        Next {
                            chain: rest,
                            transport: self.transport,
                        },
                    )
                    .await
            }
            None => self.transport.execute(request).await,
        }
    }
}

/// The ordered, immutable middleware list of a client.
///
/// Shared read-only across every request sent through the owning client;
/// safe to invoke concurrently since each invocation operates on an
/// independent request.
#[derive(Clone)]
pub struct MiddlewareChain {
    entries: Arc<[Arc<dyn Middleware>]>,
}

impl MiddlewareChain {
    pub(crate) fn new(entries: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Number of registered middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no middleware is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) async fn execute(
        &self,
        transport: &dyn Transport,
        request: FinalizedRequest,
    ) -> Result<Response> {
        Next {
            chain: &self.entries,
            transport,
        }
        .run(request)
        .await
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.entries.len())
            .finish()
    }
}
