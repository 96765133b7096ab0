//! Polymorphic request arguments
//!
//! The one-shot entry points accept heterogeneous values (header maps,
//! query maps, bodies, file sets) through a single closed enum: each
//! variant tags the value with its intended role, and the entry points
//! match exhaustively, so an unsupported combination is a compile error
//! rather than a runtime surprise.

use std::collections::HashMap;

use courier_client::FileRef;
use serde_json::Value;

/// A caller-supplied value tagged with its role in the request.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Request headers.
    Headers(HashMap<String, String>),
    /// URL query parameters.
    Params(HashMap<String, String>),
    /// JSON body.
    Json(Value),
    /// URL-encoded form body.
    Form(HashMap<String, String>),
    /// File set for a multipart body.
    Files(HashMap<String, FileRef>),
}

/// Tag a map as request headers.
#[must_use]
pub fn as_headers(headers: HashMap<String, String>) -> Argument {
    Argument::Headers(headers)
}

/// Tag a map as URL query parameters.
#[must_use]
pub fn as_params(params: HashMap<String, String>) -> Argument {
    Argument::Params(params)
}

/// Tag a JSON value as the request body.
///
/// Use `serde_json::json!` or `serde_json::to_value` to produce the value.
#[must_use]
pub fn as_json(value: Value) -> Argument {
    Argument::Json(value)
}

/// Tag a map as a form-urlencoded request body.
#[must_use]
pub fn as_form(fields: HashMap<String, String>) -> Argument {
    Argument::Form(fields)
}

/// Tag a map as a multipart file set.
#[must_use]
pub fn as_files(files: HashMap<String, FileRef>) -> Argument {
    Argument::Files(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_tag_the_expected_variant() {
        assert!(matches!(as_headers(HashMap::new()), Argument::Headers(_)));
        assert!(matches!(as_params(HashMap::new()), Argument::Params(_)));
        assert!(matches!(
            as_json(serde_json::json!({"a": 1})),
            Argument::Json(_)
        ));
        assert!(matches!(as_form(HashMap::new()), Argument::Form(_)));
        assert!(matches!(as_files(HashMap::new()), Argument::Files(_)));
    }
}
