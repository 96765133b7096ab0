//! Hook middleware
//!
//! Runs caller-supplied closures around the rest of the chain:
//! before-request hooks may mutate the outgoing request and abort the chain
//! by returning an error; after-response hooks observe the outcome and run
//! in reverse registration order, mirroring the unwinding of the chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::middleware::{Middleware, Next};
use crate::request::FinalizedRequest;
use crate::response::Response;

type BeforeHook = Arc<dyn Fn(&mut FinalizedRequest) -> Result<()> + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Result<Response>) + Send + Sync>;

/// Middleware assembled from before/after hook closures.
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
}

impl Hooks {
    /// A hook middleware with no hooks registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook that runs before the request is dispatched. An error
    /// aborts the chain immediately.
    #[must_use]
    pub fn before_request(
        mut self,
        hook: impl Fn(&mut FinalizedRequest) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.before.push(Arc::new(hook));
        self
    }

    /// Register a hook that observes the outcome after the inner chain
    /// returns.
    #[must_use]
    pub fn after_response(
        mut self,
        hook: impl Fn(&Result<Response>) + Send + Sync + 'static,
    ) -> Self {
        self.after.push(Arc::new(hook));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

#[async_trait]
impl Middleware for Hooks {
    async fn handle(&self, request: FinalizedRequest, next: Next<'_>) -> Result<Response> {
        let mut request = request;
        for hook in &self.before {
            hook(&mut request)?;
        }

        let outcome = next.run(request).await;

        for hook in self.after.iter().rev() {
            hook(&outcome);
        }

        outcome
    }
}
