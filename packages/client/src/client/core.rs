//! Core client implementation
//!
//! A [`Client`] owns the transport, the defaults applied to every request
//! and the middleware chain. All of it is immutable after construction and
//! shared through a cheap `Arc` clone, so any number of concurrent requests
//! and batch workers can read it without locking.

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;

use crate::batch::Batch;
use crate::error::Result;
use crate::middleware::MiddlewareChain;
use crate::request::body::BodySlots;
use crate::request::{FinalizedRequest, RequestBuilder};
use crate::response::Response;
use crate::transport::Transport;

/// Default settings applied to every request sent through a client.
///
/// Built once by [`ClientBuilder::build`](crate::client::ClientBuilder::build)
/// and only ever read afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientDefaults {
    pub(crate) base_url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) params: HashMap<String, String>,
    pub(crate) body: BodySlots,
}

#[derive(Debug)]
pub(crate) struct ClientInner {
    pub(crate) defaults: ClientDefaults,
    pub(crate) chain: MiddlewareChain,
    pub(crate) transport: Arc<dyn Transport>,
}

/// A reusable HTTP client: connection pool and cookie store (owned by the
/// transport), default configuration, and the middleware chain.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub(crate) fn from_inner(inner: ClientInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Client with default settings for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Start configuring a client.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> crate::client::ClientBuilder {
        crate::client::ClientBuilder::new(base_url)
    }

    /// The configured base URL, possibly empty.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.defaults.base_url
    }

    /// The default headers sent with every request.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.inner.defaults.headers
    }

    /// The registered middleware chain.
    #[must_use]
    pub fn middleware_chain(&self) -> &MiddlewareChain {
        &self.inner.chain
    }

    /// Start building a request against this client.
    #[must_use]
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(self.clone())
    }

    /// Start assembling a batch of concurrent requests.
    #[must_use]
    pub fn batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    /// Send a GET to the base URL using only the client defaults.
    pub async fn get(&self) -> Result<Response> {
        self.request().get().await
    }

    /// Send a POST to the base URL using only the client defaults.
    pub async fn post(&self) -> Result<Response> {
        self.request().post().await
    }

    pub(crate) fn defaults(&self) -> &ClientDefaults {
        &self.inner.defaults
    }

    /// Run a finalized request through the middleware chain and the
    /// transport.
    pub(crate) async fn dispatch(&self, request: FinalizedRequest) -> Result<Response> {
        self.inner
            .chain
            .execute(self.inner.transport.as_ref(), request)
            .await
    }
}
