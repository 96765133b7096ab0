//! Request construction: builder, body encodings and file payloads

pub mod body;
pub mod builder;
pub mod file;

pub use body::BodyEncoding;
pub use builder::{FinalizedRequest, RequestBuilder};
pub use file::FileRef;
