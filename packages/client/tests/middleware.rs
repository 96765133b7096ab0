//! Middleware chain tests: ordering, short-circuiting, retry and hooks.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier_client::{
    Client, Error, FinalizedRequest, HeaderMap, HeaderValue, Middleware, Next, Response, Result,
    Retrier, RetryPolicy, StatusCode,
};

use common::{RecordingMiddleware, ScriptedTransport};

#[tokio::test]
async fn first_registered_middleware_is_outermost() {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let transport = ScriptedTransport::ok();
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(RecordingMiddleware::new("a", log.clone()))
        .middleware(RecordingMiddleware::new("b", log.clone()))
        .build()
        .expect("client");

    client.get().await.expect("response");

    let recorded = log.lock().expect("log lock").clone();
    assert_eq!(
        recorded,
        vec!["a:request", "b:request", "b:result", "a:result"]
    );
    assert_eq!(transport.calls(), 1);
}

/// Middleware that answers from its own state without calling `next`.
struct ShortCircuit;

#[async_trait]
impl Middleware for ShortCircuit {
    async fn handle(&self, _request: FinalizedRequest, _next: Next<'_>) -> Result<Response> {
        Ok(Response::new(
            StatusCode::NO_CONTENT,
            HeaderMap::new(),
            &b""[..],
        ))
    }
}

#[tokio::test]
async fn middleware_may_skip_the_terminal_call() {
    let transport = ScriptedTransport::ok();
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(ShortCircuit)
        .build()
        .expect("client");

    let response = client.get().await.expect("response");
    assert_eq!(response.status().expect("status"), StatusCode::NO_CONTENT);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn retry_exhausts_and_returns_the_last_error() {
    let transport = ScriptedTransport::failing();
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(Retrier::new(
            RetryPolicy::new().count(2).backoff(Duration::ZERO),
        ))
        .build()
        .expect("client");

    let err = client.get().await.expect_err("all attempts fail");
    // Initial attempt plus two retries.
    assert_eq!(transport.calls(), 3);
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn retry_stops_at_the_first_success() {
    let transport = ScriptedTransport::ok();
    transport.push(Err(Error::Transport("flaky".into())));
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(Retrier::new(
            RetryPolicy::new().count(5).backoff(Duration::ZERO),
        ))
        .build()
        .expect("client");

    let response = client.get().await.expect("second attempt succeeds");
    assert_eq!(transport.calls(), 2);
    assert_eq!(response.status().expect("status"), StatusCode::OK);
}

#[tokio::test]
async fn retry_predicate_can_target_status_codes() {
    let transport = ScriptedTransport::ok();
    transport.push_response(StatusCode::SERVICE_UNAVAILABLE, b"");
    transport.push_response(StatusCode::SERVICE_UNAVAILABLE, b"");
    transport.push_response(StatusCode::OK, b"done");

    let policy = RetryPolicy::new()
        .count(5)
        .backoff(Duration::ZERO)
        .retry_if(|outcome| match outcome {
            Ok(response) => !response.is_success(),
            Err(_) => true,
        });
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(Retrier::new(policy))
        .build()
        .expect("client");

    let response = client.get().await.expect("eventual success");
    assert_eq!(transport.calls(), 3);
    assert_eq!(response.text().expect("text"), "done");
}

#[tokio::test]
async fn before_hooks_mutate_the_outgoing_request() {
    let transport = ScriptedTransport::ok();
    let hooks = courier_client::Hooks::new().before_request(|request| {
        request
            .headers
            .insert("x-injected", HeaderValue::from_static("yes"));
        Ok(())
    });
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(hooks)
        .build()
        .expect("client");

    client.get().await.expect("response");

    let seen = transport.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers["x-injected"], "yes");
}

#[tokio::test]
async fn failing_before_hook_aborts_without_network() {
    let transport = ScriptedTransport::ok();
    let hooks = courier_client::Hooks::new()
        .before_request(|_| Err(Error::Transport("rejected by hook".into())));
    let client = Client::builder("https://api.example.com")
        .transport(transport.clone())
        .middleware(hooks)
        .build()
        .expect("client");

    let err = client.get().await.expect_err("hook aborts");
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn after_hooks_run_in_reverse_registration_order() {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let first = log.clone();
    let second = log.clone();
    let hooks = courier_client::Hooks::new()
        .after_response(move |_| first.lock().expect("lock").push("first".into()))
        .after_response(move |_| second.lock().expect("lock").push("second".into()));
    let client = Client::builder("https://api.example.com")
        .transport(ScriptedTransport::ok())
        .middleware(hooks)
        .build()
        .expect("client");

    client.get().await.expect("response");

    assert_eq!(
        log.lock().expect("lock").clone(),
        vec!["second".to_string(), "first".to_string()]
    );
}
