//! HTTP protocol layer module
//!
//! Range parsing, content types, streaming bodies and response builders,
//! decoupled from how entries are resolved.

pub mod body;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::FileBody;
pub use range::{parse_range_header, RangeOutcome, RangeSpec};
pub use response::{
    build_error_response, build_full_response, build_partial_response, ServeBody, ServedFile,
};
