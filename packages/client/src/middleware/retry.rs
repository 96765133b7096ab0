//! Retry middleware
//!
//! Re-invokes the rest of the chain while a predicate over the outcome
//! holds, sleeping a fixed backoff between attempts. Transient failures are
//! logged, never swallowed silently: when retries are exhausted the last
//! attempt's result is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::middleware::{Middleware, Next};
use crate::request::FinalizedRequest;
use crate::response::Response;

type RetryPredicate = Arc<dyn Fn(&Result<Response>) -> bool + Send + Sync>;

/// Strategy for retrying a failed request.
#[derive(Clone)]
pub struct RetryPolicy {
    count: u32,
    backoff: Duration,
    predicate: Option<RetryPredicate>,
}

impl RetryPolicy {
    /// Policy with the default settings: 3 retries, 1 second backoff,
    /// retry on any error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retries after the initial attempt.
    #[must_use]
    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Fixed delay between attempts. Zero disables the sleep.
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Retry condition over the attempt's outcome. The default retries on
    /// any error.
    #[must_use]
    pub fn retry_if(
        mut self,
        predicate: impl Fn(&Result<Response>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    fn should_retry(&self, outcome: &Result<Response>) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(outcome),
            None => outcome.is_err(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            count: 3,
            backoff: Duration::from_secs(1),
            predicate: None,
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("count", &self.count)
            .field("backoff", &self.backoff)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Middleware applying a [`RetryPolicy`] around the rest of the chain.
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    /// Build a retrier from a policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Middleware for Retrier {
    async fn handle(&self, request: FinalizedRequest, next: Next<'_>) -> Result<Response> {
        let mut outcome = next.run(request.clone()).await;
        let mut attempt: u32 = 0;

        while self.policy.should_retry(&outcome) && attempt < self.policy.count {
            warn!(
                attempt = attempt + 1,
                backoff_ms = self.policy.backoff.as_millis() as u64,
                error = outcome.as_ref().err().map(tracing::field::display),
                "request attempt failed, retrying after backoff"
            );
            if !self.policy.backoff.is_zero() {
                tokio::time::sleep(self.policy.backoff).await;
            }
            attempt += 1;
            outcome = next.run(request.clone()).await;
        }

        outcome
    }
}
