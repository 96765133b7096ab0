//! Request builder and the default/override merge
//!
//! A [`RequestBuilder`] accumulates per-request overrides on top of the
//! owning client's defaults and, at send time, runs the merge that produces
//! the one [`FinalizedRequest`] handed to the middleware chain.
//!
//! The builder threads an explicit two-state machine through every
//! configuration call: `Ready` carries the accumulating spec, `Failed`
//! carries the first error. Once failed, every later call is a no-op and
//! `build()` returns the stored error without any network I/O.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::request::body::{self, BodySlots};
use crate::request::file::FileRef;
use crate::response::Response;

/// Per-request state accumulated before the merge.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestSpec {
    pub(crate) url: Option<Url>,
    pub(crate) headers: HeaderMap,
    pub(crate) params: HashMap<String, String>,
    pub(crate) body: BodySlots,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: Option<CancellationToken>,
}

#[derive(Debug, Clone)]
enum BuilderState {
    Ready(Box<RequestSpec>),
    Failed(Error),
}

/// Fluent builder for a single request.
///
/// Created by [`Client::request`]. Configuration calls chain; the first
/// failure is sticky and short-circuits everything after it.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: Client,
    state: BuilderState,
}

/// A fully merged outgoing request, ready for the middleware chain and the
/// transport.
#[derive(Debug, Clone)]
pub struct FinalizedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RequestBuilder {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            state: BuilderState::Ready(Box::default()),
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut RequestSpec) -> Result<()>) -> Self {
        if let BuilderState::Ready(spec) = &mut self.state {
            if let Err(err) = f(spec) {
                tracing::debug!(error = %err, "request builder entered failed state");
                self.state = BuilderState::Failed(err);
            }
        }
        self
    }

    /// Set or extend the request URL.
    ///
    /// An absolute URL replaces whatever is currently set. A relative path
    /// is joined onto the current URL, or onto the client's base URL when
    /// none is set yet. A malformed URL (or base URL) sets the sticky error.
    #[must_use]
    pub fn url(self, raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(absolute) => self.configure(|spec| {
                spec.url = Some(absolute);
                Ok(())
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base_url = self.client.base_url().to_string();
                self.configure(|spec| {
                    let mut target = match spec.url.take() {
                        Some(url) => url,
                        None => parse_base_url(&base_url)?,
                    };
                    let joined = join_path(target.path(), raw);
                    target.set_path(&joined);
                    spec.url = Some(target);
                    Ok(())
                })
            }
            Err(err) => self.configure(|_| Err(Error::invalid_url(raw, err))),
        }
    }

    /// Replace the full per-request header set. Not additive across calls.
    #[must_use]
    pub fn headers(self, headers: HashMap<String, String>) -> Self {
        self.configure(|spec| {
            spec.headers = header_map_from(&headers)?;
            Ok(())
        })
    }

    /// Replace the full per-request query-parameter set.
    #[must_use]
    pub fn params(self, params: HashMap<String, String>) -> Self {
        self.configure(|spec| {
            spec.params = params;
            Ok(())
        })
    }

    /// Set the JSON body slot. Serialization happens eagerly; a
    /// non-serializable value sets the sticky error.
    #[must_use]
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        self.configure(|spec| {
            spec.body.json = Some(
                serde_json::to_value(value)
                    .map_err(|err| Error::Encoding(format!("JSON body: {err}")))?,
            );
            Ok(())
        })
    }

    /// Set the form body slot.
    #[must_use]
    pub fn form(self, fields: HashMap<String, String>) -> Self {
        self.configure(|spec| {
            spec.body.form = fields;
            Ok(())
        })
    }

    /// Set the raw binary body slot.
    #[must_use]
    pub fn binary(self, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        self.configure(|spec| {
            spec.body.binary = data;
            Ok(())
        })
    }

    /// Set the file set for a multipart body.
    #[must_use]
    pub fn files(self, files: HashMap<String, FileRef>) -> Self {
        self.configure(|spec| {
            spec.body.files = files;
            Ok(())
        })
    }

    /// Deadline for this request, forwarded to the transport.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.configure(|spec| {
            spec.timeout = Some(timeout);
            Ok(())
        })
    }

    /// Cancellation handle for this request, forwarded to the transport.
    #[must_use]
    pub fn cancel_token(self, token: CancellationToken) -> Self {
        self.configure(|spec| {
            spec.cancel = Some(token);
            Ok(())
        })
    }

    /// The sticky build error, when one is set.
    #[must_use]
    pub fn build_error(&self) -> Option<&Error> {
        match &self.state {
            BuilderState::Failed(err) => Some(err),
            BuilderState::Ready(_) => None,
        }
    }

    /// Run the merge and produce the finalized outgoing request.
    ///
    /// Steps, in order: URL resolution (request URL, else client base URL),
    /// query-parameter merge (URL query, then client defaults, then
    /// per-request params), body merge (precedence Files > Binary > JSON >
    /// Form), header merge (client defaults overlaid by per-request headers,
    /// then the body-implied Content-Type only if none was set explicitly).
    pub fn build(self, method: Method) -> Result<FinalizedRequest> {
        let spec = match self.state {
            BuilderState::Failed(err) => return Err(err),
            BuilderState::Ready(spec) => spec,
        };
        let defaults = self.client.defaults();

        // 1. URL resolution.
        let mut url = match spec.url {
            Some(url) => url,
            None => parse_base_url(self.client.base_url())?,
        };

        // 2. Query-parameter merge.
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        overlay_pairs(&mut pairs, &defaults.params);
        overlay_pairs(&mut pairs, &spec.params);
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let mut editor = url.query_pairs_mut();
            editor.clear();
            for (key, value) in &pairs {
                editor.append_pair(key, value);
            }
            drop(editor);
        }

        // 3. Body merge and encoding.
        let encoding = body::merge(&defaults.body, &spec.body);
        let encoded = body::encode(encoding)?;

        // 4. Header merge.
        let mut headers = defaults.headers.clone();
        for (name, value) in &spec.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(content_type) = encoded.content_type {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, content_type);
            }
        }

        Ok(FinalizedRequest {
            method,
            url,
            headers,
            body: encoded.bytes,
            timeout: spec.timeout,
            cancel: spec.cancel,
        })
    }

    async fn send(self, method: Method) -> Result<Response> {
        let client = self.client.clone();
        let request = self.build(method)?;
        client.dispatch(request).await
    }

    /// Send the request as a GET.
    pub async fn get(self) -> Result<Response> {
        self.send(Method::GET).await
    }

    /// Send the request as a POST.
    pub async fn post(self) -> Result<Response> {
        self.send(Method::POST).await
    }

    /// Send the request as a PUT.
    pub async fn put(self) -> Result<Response> {
        self.send(Method::PUT).await
    }

    /// Send the request as a DELETE.
    pub async fn delete(self) -> Result<Response> {
        self.send(Method::DELETE).await
    }
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    if base_url.is_empty() {
        return Err(Error::NoUrlConfigured);
    }
    Url::parse(base_url).map_err(|err| Error::invalid_base_url(base_url, err))
}

pub(crate) fn header_map_from(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            Error::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            }
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| Error::InvalidHeader {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Overlay `overrides` onto accumulated query pairs: every overridden key
/// loses its previous values. Keys are applied in sorted order so merged
/// query strings are deterministic.
fn overlay_pairs(pairs: &mut Vec<(String, String)>, overrides: &HashMap<String, String>) {
    let mut keys: Vec<&String> = overrides.keys().collect();
    keys.sort();
    for key in keys {
        pairs.retain(|(existing, _)| existing != key);
        pairs.push((key.clone(), overrides[key].clone()));
    }
}

fn join_path(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}
