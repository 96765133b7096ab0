//! Client construction
//!
//! The builder collects defaults, middleware and transport settings, then
//! freezes them into an immutable [`Client`]. Middleware registration is
//! append-only here and sealed at `build()`; nothing on the client can be
//! reconfigured afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::client::core::{Client, ClientDefaults, ClientInner};
use crate::error::{Error, Result};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::request::body::BodySlots;
use crate::request::builder::header_map_from;
use crate::request::FileRef;
use crate::transport::{ReqwestTransport, Transport, TransportConfig};

/// Fluent configuration for a [`Client`].
pub struct ClientBuilder {
    base_url: String,
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    body: BodySlots,
    middlewares: Vec<Arc<dyn Middleware>>,
    cookies: HashMap<String, String>,
    timeout: Duration,
    follow_redirects: bool,
    transport: Option<Arc<dyn Transport>>,
    first_error: Option<Error>,
}

impl ClientBuilder {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: BodySlots::default(),
            middlewares: Vec::new(),
            cookies: HashMap::new(),
            timeout: Duration::from_secs(30),
            follow_redirects: true,
            transport: None,
            first_error: None,
        }
    }

    fn fail(&mut self, err: Error) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }

    /// Default headers sent with every request. Whole-map replacement.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Default query parameters added to every request. Whole-map
    /// replacement.
    #[must_use]
    pub fn params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Default JSON body. Serialized eagerly; a non-serializable value
    /// fails `build()`.
    #[must_use]
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.body.json = Some(value),
            Err(err) => self.fail(Error::Encoding(format!("JSON body: {err}"))),
        }
        self
    }

    /// Default form body.
    #[must_use]
    pub fn form(mut self, fields: HashMap<String, String>) -> Self {
        self.body.form = fields;
        self
    }

    /// Default raw binary body.
    #[must_use]
    pub fn binary(mut self, data: impl Into<Bytes>) -> Self {
        self.body.binary = data.into();
        self
    }

    /// Default file set for multipart bodies.
    #[must_use]
    pub fn files(mut self, files: HashMap<String, FileRef>) -> Self {
        self.body.files = files;
        self
    }

    /// Append a middleware. First registered is outermost.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Seed the cookie jar with name/value pairs scoped to the base URL's
    /// scheme and host. Requires the bundled transport and a base URL with
    /// a host.
    #[must_use]
    pub fn cookies(mut self, cookies: HashMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Whole-request timeout for the bundled transport.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the bundled transport follows redirects. Defaults to true.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Replace the transport entirely.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Freeze the configuration into a [`Client`].
    pub fn build(self) -> Result<Client> {
        if let Some(err) = self.first_error {
            return Err(err);
        }

        let headers = header_map_from(&self.headers)?;
        let cookie_seeds = cookie_seeds(&self.base_url, &self.cookies)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(custom) => {
                if !cookie_seeds.is_empty() {
                    return Err(Error::Transport(
                        "cookie seeding requires the bundled transport".into(),
                    ));
                }
                custom
            }
            None => Arc::new(ReqwestTransport::with_config(TransportConfig {
                timeout: self.timeout,
                follow_redirects: self.follow_redirects,
                cookies: cookie_seeds,
                ..TransportConfig::default()
            })?),
        };

        Ok(Client::from_inner(ClientInner {
            defaults: ClientDefaults {
                base_url: self.base_url,
                headers,
                params: self.params,
                body: self.body,
            },
            chain: MiddlewareChain::new(self.middlewares),
            transport,
        }))
    }
}

/// Resolve the cookie map into jar seeds keyed by the base URL's origin.
fn cookie_seeds(base_url: &str, cookies: &HashMap<String, String>) -> Result<Vec<(Url, String)>> {
    if cookies.is_empty() {
        return Ok(Vec::new());
    }
    if base_url.is_empty() {
        return Err(Error::InvalidBaseUrl {
            url: String::new(),
            reason: "cookie seeding requires a configured base URL".into(),
        });
    }
    let origin = Url::parse(base_url).map_err(|err| Error::invalid_base_url(base_url, err))?;
    if origin.host_str().is_none() {
        return Err(Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "could not determine a valid scheme and host".into(),
        });
    }

    Ok(cookies
        .iter()
        .map(|(name, value)| (origin.clone(), format!("{name}={value}; Path=/")))
        .collect())
}
