//! HTTP response building module
//!
//! Builders for complete-file (200), partial-content (206) and error responses.
//! Every response shares the boxed [`ServeBody`] type so handlers can return any of them.

use super::body::FileBody;
use super::range::RangeSpec;
use crate::error::ServeError;
use crate::storage::FileEntry;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::io;

/// Response body used by every handler
pub type ServeBody = BoxBody<Bytes, io::Error>;

/// Content type of error responses
pub const ERROR_CONTENT_TYPE: &str = "text/html";

/// Read-only view of the entry being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub name: String,
    pub length: u64,
    pub mime_type: &'static str,
}

impl ServedFile {
    pub fn from_entry(entry: &dyn FileEntry) -> Self {
        Self {
            name: entry.name().to_string(),
            length: entry.length(),
            mime_type: super::mime::content_type_for_name(entry.name()),
        }
    }
}

/// Build 200 OK response streaming the whole file
pub fn build_full_response(file: &ServedFile, body: FileBody) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, file.mime_type)
        .header(CONTENT_LENGTH, file.length)
        .header(ACCEPT_RANGES, "bytes")
        .body(body.boxed())
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            fallback_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 206 Partial Content response streaming `range` of the file
pub fn build_partial_response(
    file: &ServedFile,
    range: &RangeSpec,
    body: FileBody,
) -> Response<ServeBody> {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, file.mime_type)
        .header(ACCEPT_RANGES, "bytes")
        .header(CONTENT_LENGTH, range.content_length())
        .header(CONTENT_RANGE, range.content_range())
        .body(body.boxed())
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            fallback_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build the terminal response for a failed request, message as body
pub fn build_error_response(err: &ServeError) -> Response<ServeBody> {
    let status = err.status();
    let message = err.to_string();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, ERROR_CONTENT_TYPE)
        .header(CONTENT_LENGTH, message.len())
        .body(full_body(message))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback_response(status)
        })
}

/// Wrap fixed content as a [`ServeBody`]
pub fn full_body(content: impl Into<Bytes>) -> ServeBody {
    Full::new(content.into())
        .map_err(|never| match never {})
        .boxed()
}

fn fallback_response(status: StatusCode) -> Response<ServeBody> {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
