//! Courier public API
//!
//! Fluent HTTP client with layered defaults, a middleware pipeline and a
//! bounded-concurrency batch executor. This crate is the public surface;
//! the implementation lives in `courier_client` and is re-exported here in
//! full.
//!
//! ## Configured client
//!
//! ```no_run
//! use std::collections::HashMap;
//! use courier::{Client, Retrier, RetryPolicy};
//!
//! # async fn demo() -> courier::Result<()> {
//! let client = Client::builder("https://api.example.com")
//!     .headers(HashMap::from([("x-api-key".to_string(), "secret".to_string())]))
//!     .middleware(Retrier::new(RetryPolicy::new().count(2)))
//!     .build()?;
//!
//! let response = client.request().url("/v1/users").get().await?;
//! let users: serde_json::Value = response.json()?;
//! # let _ = users;
//! # Ok(())
//! # }
//! ```
//!
//! ## One-shot requests
//!
//! ```no_run
//! use courier::{as_params, get};
//! use std::collections::HashMap;
//!
//! # async fn demo() -> courier::Result<()> {
//! let response = get(
//!     "https://api.example.com/v1/users",
//!     [as_params(HashMap::from([("page".to_string(), "1".to_string())]))],
//! )
//! .await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod argument;

pub use argument::{as_files, as_form, as_headers, as_json, as_params, Argument};

// Re-export the full client implementation.
pub use courier_client::*;

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

/// Assemble a one-shot client for `url`, applying the tagged arguments.
///
/// Body-shaped arguments are honored only when `allow_body` is set; the GET
/// entry point passes `false` and silently ignores them, preserving the
/// long-standing behavior of the convenience path (see DESIGN.md).
fn client_for(url: &str, args: Vec<Argument>, allow_body: bool) -> Result<Client> {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut params: HashMap<String, String> = HashMap::new();
    let mut json: Option<Value> = None;
    let mut form: HashMap<String, String> = HashMap::new();
    let mut files: HashMap<String, FileRef> = HashMap::new();

    for arg in args {
        match arg {
            Argument::Headers(map) => headers.extend(map),
            Argument::Params(map) => params.extend(map),
            Argument::Json(value) => {
                if allow_body {
                    json = Some(value);
                }
            }
            Argument::Form(map) => {
                if allow_body {
                    form.extend(map);
                }
            }
            Argument::Files(map) => {
                if allow_body {
                    files.extend(map);
                }
            }
        }
    }

    let mut builder = Client::builder(url).headers(headers).params(params);
    if let Some(value) = json {
        builder = builder.json(&value);
    }
    if !form.is_empty() {
        builder = builder.form(form);
    }
    if !files.is_empty() {
        builder = builder.files(files);
    }
    builder.build()
}

/// Send a one-shot GET to `url`.
///
/// Accepts [`Argument`]s built with [`as_headers`] and [`as_params`];
/// body-shaped arguments ([`as_json`], [`as_form`], [`as_files`]) are
/// ignored on this path.
pub async fn get(url: &str, args: impl IntoIterator<Item = Argument>) -> Result<Response> {
    debug!(url, "one-shot GET");
    client_for(url, args.into_iter().collect(), false)?.get().await
}

/// Send a one-shot POST to `url`, honoring header, param and body
/// arguments alike.
pub async fn post(url: &str, args: impl IntoIterator<Item = Argument>) -> Result<Response> {
    debug!(url, "one-shot POST");
    client_for(url, args.into_iter().collect(), true)?.post().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn header_arguments_accumulate_across_instances() {
        let client = client_for(
            "https://api.example.com",
            vec![
                as_headers(string_map(&[("x-a", "1")])),
                as_headers(string_map(&[("x-b", "2")])),
            ],
            false,
        )
        .expect("client");
        assert_eq!(client.default_headers()["x-a"], "1");
        assert_eq!(client.default_headers()["x-b"], "2");
    }

    #[test]
    fn get_path_ignores_body_arguments() {
        let client = client_for(
            "https://api.example.com",
            vec![as_json(json!({"ignored": true}))],
            false,
        )
        .expect("client");
        // The client carries no body default, so a GET built from it sends
        // no Content-Type.
        let request = client
            .request()
            .build(Method::GET)
            .expect("build");
        assert!(request.body.is_none());
        assert!(!request.headers.contains_key(http::header::CONTENT_TYPE));
    }

    #[test]
    fn post_path_honors_body_arguments() {
        let client = client_for(
            "https://api.example.com",
            vec![as_json(json!({"kept": true}))],
            true,
        )
        .expect("client");
        let request = client
            .request()
            .build(Method::POST)
            .expect("build");
        assert!(request.body.is_some());
    }
}
