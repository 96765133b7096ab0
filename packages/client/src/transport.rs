//! Transport boundary
//!
//! Everything connection-level lives behind the narrow [`Transport`]
//! contract: execute one finalized request, return the raw response or an
//! error. The bundled [`ReqwestTransport`] delegates pooling, TLS,
//! redirects and cookie persistence to `reqwest`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::request::FinalizedRequest;
use crate::response::Response;

/// Executes one finalized request against the network.
///
/// Implementations must be safe for concurrent use: every batch worker
/// calls `execute` through a shared reference.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform the network exchange for `request`.
    async fn execute(&self, request: FinalizedRequest) -> Result<Response>;
}

/// Connection-level settings for the bundled transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout applied when a request carries none of its own.
    pub timeout: Duration,
    /// Whether redirects are followed automatically.
    pub follow_redirects: bool,
    /// Idle connections kept per host for reuse.
    pub pool_max_idle_per_host: usize,
    /// Cookies seeded into the jar before the first request, paired with
    /// the scheme+host they belong to.
    pub cookies: Vec<(Url, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            follow_redirects: true,
            pool_max_idle_per_host: 100,
            cookies: Vec::new(),
        }
    }
}

/// The default [`Transport`], backed by a pooled `reqwest` client with a
/// cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Build a transport from explicit settings.
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let jar = Arc::new(reqwest::cookie::Jar::default());
        for (origin, cookie) in &config.cookies {
            jar.add_cookie_str(cookie, origin);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .cookie_provider(jar);
        if !config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        let client = builder
            .build()
            .map_err(|err| Error::Transport(format!("failed to build transport client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: FinalizedRequest) -> Result<Response> {
        debug!(method = %request.method, url = %request.url, "dispatching request");

        let mut outgoing = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(timeout) = request.timeout {
            outgoing = outgoing.timeout(timeout);
        }
        if let Some(body) = request.body {
            outgoing = outgoing.body(body);
        }

        let send = outgoing.send();
        let raw = match &request.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => return Err(Error::Cancelled),
                result = send => result,
            },
            None => send.await,
        }
        .map_err(Error::from)?;

        let status = raw.status();
        let headers = raw.headers().clone();
        debug!(status = status.as_u16(), "response received");

        match raw.bytes().await {
            Ok(body) => Ok(Response::new(status, headers, body)),
            Err(err) => Ok(Response::with_read_error(
                status,
                headers,
                Error::BodyRead(err.to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn redirects_can_be_disabled() {
        let config = TransportConfig {
            follow_redirects: false,
            ..TransportConfig::default()
        };
        assert!(ReqwestTransport::with_config(config).is_ok());
    }
}
