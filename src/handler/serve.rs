//! Request serving module
//!
//! Entry point for HTTP request processing. Each request walks the same steps:
//! decode the path, resolve it to a file entry, then answer with the whole file
//! or the requested byte range.

use crate::config::AppState;
use crate::error::ServeError;
use crate::http::body::FileBody;
use crate::http::range::{parse_range_header, RangeOutcome};
use crate::http::response::{
    build_error_response, build_full_response, build_partial_response, ServeBody, ServedFile,
};
use crate::logger::{self, AccessLogEntry};
use crate::storage::{EntryReader, FileEntry};
use hyper::body::Body;
use hyper::header::{HeaderMap, RANGE, REFERER, USER_AGENT};
use hyper::{Request, Response};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// Never fails at the service level: every failure becomes its own error response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ServeBody>, Infallible> {
    let started = Instant::now();
    let path = req.uri().path().to_string();
    let range = header_string(req.headers(), &RANGE);

    tracing::debug!(method = %req.method(), path = %path, range = ?range, "Request");

    let response = match serve(&path, range.as_deref(), &state).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                ServeError::Io(e) => logger::log_error(&format!("I/O error serving {path}: {e}")),
                other => tracing::debug!(path = %path, status = %other.status(), "{other}"),
            }
            build_error_response(&err)
        }
    };

    if state.access_log_enabled() {
        let mut entry =
            AccessLogEntry::new(remote_addr.to_string(), req.method().to_string(), path);
        entry.http_version = http_version(&req).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.range = range;
        entry.referer = header_string(req.headers(), &REFERER);
        entry.user_agent = header_string(req.headers(), &USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the request state machine for an already-extracted path and `Range` value
pub async fn serve(
    raw_path: &str,
    range: Option<&str>,
    state: &Arc<AppState>,
) -> Result<Response<ServeBody>, ServeError> {
    let uri = decode_uri(raw_path)?;

    let resolver = Arc::clone(&state.resolver);
    let entry = tokio::task::spawn_blocking(move || resolver.resolve(&uri))
        .await
        .map_err(|e| ServeError::Io(io::Error::other(e)))??;

    match range {
        None => serve_complete_file(entry).await,
        Some(header) => serve_range_of_file(entry, header).await,
    }
}

/// Percent-decode the request path; the result must be UTF-8
pub fn decode_uri(raw_path: &str) -> Result<String, ServeError> {
    percent_decode_str(raw_path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| ServeError::Decode)
}

async fn serve_complete_file(
    entry: Arc<dyn FileEntry>,
) -> Result<Response<ServeBody>, ServeError> {
    let file = ServedFile::from_entry(entry.as_ref());
    tracing::debug!(name = %file.name, length = file.length, "Serving complete file");

    let reader = open_reader(entry, 0).await?;
    Ok(build_full_response(&file, FileBody::new(reader, file.length)))
}

async fn serve_range_of_file(
    entry: Arc<dyn FileEntry>,
    header: &str,
) -> Result<Response<ServeBody>, ServeError> {
    let file = ServedFile::from_entry(entry.as_ref());

    let range = match parse_range_header(header, file.length) {
        Ok(RangeOutcome::Satisfiable(range)) => range,
        Ok(RangeOutcome::Unsatisfiable) => return Err(ServeError::Unsatisfiable),
        Err(_) => return Err(ServeError::RangeFormat),
    };

    let content_length = range.content_length();
    tracing::debug!(
        name = %file.name,
        start = range.start,
        end = range.end,
        content_length,
        "Serving range of file"
    );

    let reader = open_reader(entry, range.skip()).await?;
    Ok(build_partial_response(
        &file,
        &range,
        FileBody::new(reader, content_length),
    ))
}

/// Open and position a reader on the blocking pool
async fn open_reader(
    entry: Arc<dyn FileEntry>,
    skip: u64,
) -> Result<Box<dyn EntryReader>, ServeError> {
    let reader = tokio::task::spawn_blocking(move || FileBody::open_reader(entry.as_ref(), skip))
        .await
        .map_err(io::Error::other)??;
    Ok(reader)
}

fn header_string(headers: &HeaderMap, name: &hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn http_version<B>(req: &Request<B>) -> &'static str {
    match req.version() {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
