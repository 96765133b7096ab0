//! Shared test doubles: a scripted transport and a recording middleware.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier_client::{
    Error, FinalizedRequest, HeaderMap, Middleware, Next, Response, Result, StatusCode, Transport,
};

/// A transport that replays a scripted sequence of outcomes and records
/// every request it sees. Once the script is exhausted it falls back to a
/// fixed outcome.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Response>>>,
    fail_by_default: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<FinalizedRequest>>,
}

impl ScriptedTransport {
    /// Empty script; every call succeeds with `200 OK` and an empty body.
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fail_by_default: false,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Empty script; every call fails with a transport error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fail_by_default: true,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Queue an explicit outcome for the next call.
    pub fn push(&self, outcome: Result<Response>) {
        self.script.lock().expect("script lock").push_back(outcome);
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: StatusCode, body: &'static [u8]) {
        self.push(Ok(Response::new(status, HeaderMap::new(), body)));
    }

    /// Number of executed calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copies of every request this transport received.
    pub fn seen(&self) -> Vec<FinalizedRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: FinalizedRequest) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("seen lock").push(request);

        if let Some(outcome) = self.script.lock().expect("script lock").pop_front() {
            return outcome;
        }
        if self.fail_by_default {
            return Err(Error::Transport("scripted failure".into()));
        }
        Ok(Response::new(StatusCode::OK, HeaderMap::new(), &b""[..]))
    }
}

/// Middleware that appends to a shared log when it sees the request and
/// when it sees the result.
pub struct RecordingMiddleware {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingMiddleware {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { name, log }
    }
}

#[async_trait]
impl Middleware for RecordingMiddleware {
    async fn handle(&self, request: FinalizedRequest, next: Next<'_>) -> Result<Response> {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("{}:request", self.name));
        let outcome = next.run(request).await;
        self.log
            .lock()
            .expect("log lock")
            .push(format!("{}:result", self.name));
        outcome
    }
}
