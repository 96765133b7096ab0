//! Buffered HTTP response wrapper
//!
//! The transport reads the whole body once; after that every accessor is
//! repeatable. When the body read failed, the failure is stored as a
//! sentinel and every derived accessor reports that same error instead of
//! partially-valid data.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// A response with its body materialized into memory.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    read_error: Option<Error>,
}

impl Response {
    /// Wrap a fully read response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            read_error: None,
        }
    }

    /// Wrap a response whose body could not be read. Every derived accessor
    /// will report `error`.
    pub fn with_read_error(status: StatusCode, headers: HeaderMap, error: Error) -> Self {
        Self {
            status,
            headers,
            body: Bytes::new(),
            read_error: Some(error),
        }
    }

    fn check(&self) -> Result<()> {
        match &self.read_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> Result<StatusCode> {
        self.check()?;
        Ok(self.status)
    }

    /// Response headers.
    pub fn headers(&self) -> Result<&HeaderMap> {
        self.check()?;
        Ok(&self.headers)
    }

    /// A single response header, when present.
    pub fn header(&self, name: &str) -> Result<Option<&HeaderValue>> {
        self.check()?;
        Ok(self.headers.get(name))
    }

    /// True when the body was read and the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.read_error.is_none() && self.status.is_success()
    }

    /// The raw body bytes.
    pub fn bytes(&self) -> Result<&Bytes> {
        self.check()?;
        Ok(&self.body)
    }

    /// The body as text. Invalid UTF-8 is replaced, never an error.
    pub fn text(&self) -> Result<String> {
        self.check()?;
        Ok(String::from_utf8_lossy(&self.body).into_owned())
    }

    /// The body parsed as a JSON value. An empty body parses as `null`.
    pub fn json(&self) -> Result<Value> {
        self.check()?;
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|err| Error::Decode(err.to_string()))
    }

    /// The body deserialized into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.check()?;
        if self.body.is_empty() {
            return Err(Error::Decode("response body is empty".into()));
        }
        serde_json::from_slice(&self.body).map_err(|err| Error::Decode(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn ok_response(body: &'static [u8]) -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), body)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn body_reads_are_repeatable() {
        let response = ok_response(b"{\"id\":1,\"name\":\"ada\"}");
        assert_eq!(response.text().expect("text"), "{\"id\":1,\"name\":\"ada\"}");
        let user: User = response.decode().expect("decode");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "ada".into()
            }
        );
        // A second read sees the same bytes.
        assert!(response.json().expect("json").is_object());
    }

    #[test]
    fn empty_body_is_null_json() {
        let response = ok_response(b"");
        assert_eq!(response.json().expect("json"), Value::Null);
        assert!(matches!(
            response.decode::<User>().expect_err("decode"),
            Error::Decode(_)
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let response = ok_response(b"{nope");
        assert!(matches!(
            response.json().expect_err("json"),
            Error::Decode(_)
        ));
    }

    #[test]
    fn read_failure_is_reported_by_every_accessor() {
        let response = Response::with_read_error(
            StatusCode::OK,
            HeaderMap::new(),
            Error::BodyRead("connection reset".into()),
        );
        assert!(matches!(
            response.status().expect_err("status"),
            Error::BodyRead(_)
        ));
        assert!(matches!(
            response.headers().expect_err("headers"),
            Error::BodyRead(_)
        ));
        assert!(matches!(
            response.text().expect_err("text"),
            Error::BodyRead(_)
        ));
        assert!(matches!(
            response.json().expect_err("json"),
            Error::BodyRead(_)
        ));
        assert!(!response.is_success());
    }
}
