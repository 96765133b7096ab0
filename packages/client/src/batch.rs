//! Bounded-concurrency batch execution
//!
//! A [`Batch`] accumulates independent tasks and, on [`Batch::run`], fans
//! them out over a fixed pool of workers pulling from a shared queue sized
//! to the batch, then fans the results back in. Every submitted task
//! produces exactly one result, cancellation included; result order is
//! unspecified, so callers needing order must key on the task identifier.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::request::RequestBuilder;
use crate::response::Response;

const DEFAULT_POOL_SIZE: usize = 10;

/// A single independent request to execute as part of a batch.
///
/// Identifiers need not be unique; they are echoed back verbatim on the
/// matching [`BatchResult`].
#[derive(Debug, Clone)]
pub struct Task {
    /// Caller-chosen identifier echoed on the result.
    pub id: String,
    /// Fully configured request; dispatched as a GET.
    pub request: RequestBuilder,
}

impl Task {
    /// Pair an identifier with a configured request.
    pub fn new(id: impl Into<String>, request: RequestBuilder) -> Self {
        Self {
            id: id.into(),
            request,
        }
    }
}

/// The outcome of one task: the task's identifier plus its response or
/// error, never neither.
#[derive(Debug)]
pub struct BatchResult {
    /// Identifier of the originating task.
    pub id: String,
    /// Response on success, error otherwise.
    pub outcome: Result<Response>,
}

/// Accumulates tasks and executes them with bounded parallelism.
#[derive(Debug)]
pub struct Batch {
    client: Client,
    tasks: Vec<Task>,
    pool_size: usize,
    cancel: CancellationToken,
    deadline: Option<Duration>,
}

impl Batch {
    /// A batch over `client` with the default pool size and no deadline.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            tasks: Vec::new(),
            pool_size: DEFAULT_POOL_SIZE,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Number of worker tasks started by [`run`](Self::run). Zero is
    /// ignored and keeps the current value.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.pool_size = size;
        }
        self
    }

    /// Batch-wide cancellation signal. Workers check it before dispatching
    /// each task, and it is wired into every request created by
    /// [`add_urls`](Self::add_urls).
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Batch-wide deadline, measured from the start of [`run`](Self::run).
    /// Tasks dispatched after it has elapsed are recorded as cancelled.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Queue one pre-configured task.
    #[must_use]
    pub fn add_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Queue several pre-configured tasks.
    #[must_use]
    pub fn add_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Queue one task per URL, using the URL itself as the identifier and
    /// wiring the batch cancellation token into each request.
    #[must_use]
    pub fn add_urls<I>(mut self, urls: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for url in urls {
            let url: String = url.into();
            let request = self
                .client
                .request()
                .cancel_token(self.cancel.clone())
                .url(&url);
            self.tasks.push(Task::new(url, request));
        }
        self
    }

    /// Number of currently queued tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Drop all queued tasks. Tasks are never cleared implicitly: a second
    /// [`run`](Self::run) replays whatever is queued.
    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    /// Execute every queued task and block until all results are in.
    ///
    /// Exactly `pool_size` workers drain a queue sized to the batch, so
    /// producers never block; each worker exits only after observing queue
    /// exhaustion, and the result channel is drained only after every
    /// worker has finished. Result order carries no relation to submission
    /// order.
    pub async fn run(&self) -> Vec<BatchResult> {
        let total = self.tasks.len();
        if total == 0 {
            return Vec::new();
        }
        debug!(
            tasks = total,
            pool_size = self.pool_size,
            "starting batch run"
        );

        let deadline_at = self.deadline.map(|deadline| Instant::now() + deadline);

        // Both channels are sized to the batch: queueing the full task list
        // never blocks, and workers never block pushing results.
        let (task_tx, task_rx) = mpsc::channel::<Task>(total);
        let (result_tx, mut result_rx) = mpsc::channel::<BatchResult>(total);

        for task in &self.tasks {
            // Capacity equals the task count, so this send cannot block.
            let _ = task_tx.send(task.clone()).await;
        }
        drop(task_tx);

        let task_rx = Arc::new(Mutex::new(task_rx));
        let mut workers = Vec::with_capacity(self.pool_size);
        for _ in 0..self.pool_size {
            let queue = Arc::clone(&task_rx);
            let results = result_tx.clone();
            let cancel = self.cancel.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    let task = { queue.lock().await.recv().await };
                    let Some(task) = task else { break };

                    // Cancelled batches still record one result per task.
                    let expired =
                        deadline_at.is_some_and(|deadline| Instant::now() >= deadline);
                    let outcome = if cancel.is_cancelled() || expired {
                        Err(Error::Cancelled)
                    } else {
                        task.request.get().await
                    };
                    let _ = results
                        .send(BatchResult {
                            id: task.id,
                            outcome,
                        })
                        .await;
                }
            }));
        }
        drop(result_tx);

        // Drain only after every worker has provably exited.
        for worker in workers {
            let _ = worker.await;
        }

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }
        debug!(results = results.len(), "batch run finished");
        results
    }
}
