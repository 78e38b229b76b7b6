//! Removable-volume HTTP file server
//!
//! Serves a directory or a single file over HTTP/1.1 with byte-range support,
//! resolving request paths through a bounded LRU cache of file entries.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{ServeError, ServerError};
pub use server::FileServer;
