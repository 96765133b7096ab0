//! Body encodings and the client/request body merge
//!
//! Both the client and an individual request carry up to four body slots
//! (JSON, form, binary, files). [`merge`] collapses the two layers into a
//! single active [`BodyEncoding`] using the precedence
//! **Files > Binary > JSON > Form**, and [`encode`] turns that encoding into
//! wire bytes plus the Content-Type it implies.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderValue;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::request::file::FileRef;

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub(crate) const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub(crate) const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// The body slots accumulated on a client or a request before the merge.
///
/// Slots are not mutually exclusive here; exclusivity is resolved by
/// [`merge`], which picks exactly one encoding for the wire.
#[derive(Debug, Clone, Default)]
pub(crate) struct BodySlots {
    pub(crate) json: Option<Value>,
    pub(crate) form: HashMap<String, String>,
    pub(crate) binary: Bytes,
    pub(crate) files: HashMap<String, FileRef>,
}

/// The single body encoding active for an outgoing request.
#[derive(Debug, Clone)]
pub enum BodyEncoding {
    /// No body.
    None,
    /// JSON-encoded value.
    Json(Value),
    /// URL-encoded form fields.
    Form(HashMap<String, String>),
    /// Raw bytes.
    Binary(Bytes),
    /// Multipart form data; plain fields ride along with the files.
    Multipart {
        fields: HashMap<String, String>,
        files: HashMap<String, FileRef>,
    },
}

impl BodyEncoding {
    /// True when no body will be sent.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, BodyEncoding::None)
    }
}

/// Collapse client-level and request-level body slots into one encoding.
///
/// Files and form fields merge key-wise with the request winning. JSON
/// merges key-wise only when both layers hold objects; otherwise the
/// request value, when present, replaces the client value outright. A
/// request-level binary body shadows the client-level one.
pub(crate) fn merge(client: &BodySlots, request: &BodySlots) -> BodyEncoding {
    let mut files = client.files.clone();
    files.extend(request.files.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut fields = client.form.clone();
    fields.extend(request.form.iter().map(|(k, v)| (k.clone(), v.clone())));

    // Multipart subsumes plain form fields, so files win over everything.
    if !files.is_empty() {
        return BodyEncoding::Multipart { fields, files };
    }

    let binary = if request.binary.is_empty() {
        client.binary.clone()
    } else {
        request.binary.clone()
    };
    if !binary.is_empty() {
        return BodyEncoding::Binary(binary);
    }

    if let Some(json) = merge_json(client.json.as_ref(), request.json.as_ref()) {
        return BodyEncoding::Json(json);
    }

    if !fields.is_empty() {
        return BodyEncoding::Form(fields);
    }

    BodyEncoding::None
}

fn merge_json(client: Option<&Value>, request: Option<&Value>) -> Option<Value> {
    match (client, request) {
        (Some(Value::Object(base)), Some(Value::Object(overlay))) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Some(Value::Object(merged))
        }
        (_, Some(request)) => Some(request.clone()),
        (Some(client), None) => Some(client.clone()),
        (None, None) => None,
    }
}

/// Wire bytes plus the Content-Type the chosen encoding implies.
///
/// The implied Content-Type is applied by the header merge only when the
/// caller has not set one explicitly.
pub(crate) struct EncodedBody {
    pub(crate) bytes: Option<Bytes>,
    pub(crate) content_type: Option<HeaderValue>,
}

pub(crate) fn encode(encoding: BodyEncoding) -> Result<EncodedBody> {
    match encoding {
        BodyEncoding::None => Ok(EncodedBody {
            bytes: None,
            content_type: None,
        }),
        BodyEncoding::Json(value) => {
            let bytes = serde_json::to_vec(&value)
                .map_err(|err| Error::Encoding(format!("JSON body: {err}")))?;
            Ok(EncodedBody {
                bytes: Some(Bytes::from(bytes)),
                content_type: Some(static_content_type(CONTENT_TYPE_JSON)),
            })
        }
        BodyEncoding::Form(fields) => {
            let encoded = serde_urlencoded::to_string(&fields)
                .map_err(|err| Error::Encoding(format!("form body: {err}")))?;
            Ok(EncodedBody {
                bytes: Some(Bytes::from(encoded)),
                content_type: Some(static_content_type(CONTENT_TYPE_FORM)),
            })
        }
        BodyEncoding::Binary(bytes) => Ok(EncodedBody {
            bytes: Some(bytes),
            content_type: Some(static_content_type(CONTENT_TYPE_OCTET_STREAM)),
        }),
        BodyEncoding::Multipart { fields, files } => encode_multipart(&fields, &files),
    }
}

fn static_content_type(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}

/// Write a multipart/form-data body.
///
/// Parts are emitted in sorted key order so the same inputs always produce
/// the same payload apart from the boundary.
fn encode_multipart(
    fields: &HashMap<String, String>,
    files: &HashMap<String, FileRef>,
) -> Result<EncodedBody> {
    let boundary = format!("----courier-{:016x}", fastrand::u64(..));
    let mut buf: Vec<u8> = Vec::new();

    let mut field_names: Vec<&String> = fields.keys().collect();
    field_names.sort();
    for name in field_names {
        buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        buf.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        buf.extend_from_slice(fields[name].as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    let mut file_fields: Vec<&String> = files.keys().collect();
    file_fields.sort();
    for field in file_fields {
        let file = &files[field];
        let data = file.read()?;
        buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        buf.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{}\"\r\n",
                file.file_name()
            )
            .as_bytes(),
        );
        buf.extend_from_slice(
            format!("Content-Type: {CONTENT_TYPE_OCTET_STREAM}\r\n\r\n").as_bytes(),
        );
        buf.extend_from_slice(&data);
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let content_type =
        HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}"))
            .map_err(|err| Error::Encoding(format!("multipart content type: {err}")))?;

    Ok(EncodedBody {
        bytes: Some(Bytes::from(buf)),
        content_type: Some(content_type),
    })
}
