//! Cache inspection tools.
//!
//! Read-only views of the cache generations the worker maintains.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
