//! Request handler module
//!
//! Path resolution with its entry cache, and the per-request serving logic.

pub mod resolver;
pub mod serve;

// Re-export main entry point
pub use resolver::{FileCache, FileResolver, CACHE_CAPACITY};
pub use serve::handle_request;
