//! # Courier HTTP client
//!
//! Fluent HTTP client layer with layered default/override configuration,
//! a composable middleware pipeline around the terminal network call, and a
//! bounded-concurrency batch executor.
//!
//! ## Architecture
//!
//! - **Client** — immutable after construction: base URL, default headers,
//!   params and body, the middleware chain, and the transport that owns the
//!   connection pool and cookie store.
//! - **RequestBuilder** — accumulates per-request overrides and runs the
//!   merge that combines them with the client defaults into one finalized
//!   request. The first configuration error is sticky: later calls become
//!   no-ops and the stored error is returned at send time.
//! - **MiddlewareChain** — ordered interceptors around the terminal call;
//!   first registered is outermost.
//! - **Batch** — fans independent requests out over a fixed worker pool and
//!   fans their results back in, one result per task, in no particular
//!   order.
//! - **Transport** — the collaborator boundary; the bundled implementation
//!   delegates pooling, TLS, redirects and cookies to `reqwest`.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod batch;
pub mod client;
pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod transport;

pub use batch::{Batch, BatchResult, Task};
pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use middleware::{Hooks, Middleware, MiddlewareChain, Next, Retrier, RetryPolicy};
pub use request::{BodyEncoding, FileRef, FinalizedRequest, RequestBuilder};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportConfig};

// Re-export the HTTP vocabulary types that appear in the public API.
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;
