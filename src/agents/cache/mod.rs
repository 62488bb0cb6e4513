//! Run-local cache for tool usage results.

pub mod cache_handler;

pub use cache_handler::CacheHandler;
