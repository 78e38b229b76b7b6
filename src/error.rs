//! Error types
//!
//! `ServeError` covers every way a single request can fail and knows its HTTP status.
//! `ServerError` covers startup and lifecycle failures.

use hyper::StatusCode;
use std::io;
use thiserror::Error;

/// Terminal failure of one request
#[derive(Error, Debug)]
pub enum ServeError {
    /// Request path is not valid UTF-8 after percent-decoding
    #[error("Unable to decode URL")]
    Decode,

    /// `Range` header present but not in the `bytes=` unit
    #[error("Range header invalid")]
    RangeFormat,

    /// Nothing in the hierarchy matches the URI
    #[error("{0}")]
    NotFound(String),

    /// The URI names a directory
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Parsed range starts before 0 or ends at/after the file length
    #[error("Start < 0 or end >= actual length")]
    Unsatisfiable,

    /// Storage driver failure
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServeError {
    /// HTTP status used for the error response
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Decode | Self::RangeFormat | Self::NotAFile(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unsatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Startup / lifecycle failure
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid address '{addr}': {source}")]
    Address {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open served root '{path}': {source}")]
    Root {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to initialize logger: {0}")]
    Logger(String),

    #[error("Server is already running on {0}")]
    AlreadyRunning(std::net::SocketAddr),

    #[error(transparent)]
    Io(#[from] io::Error),
}
