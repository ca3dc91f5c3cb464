//! SQLite-backed storage for cache generations.
//!
//! This module provides a persistent store of named cache generations using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Request keys derived from method + URL using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-generation deletion (no per-entry eviction)
//! - A durable queue of reservations submitted while offline

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod queue;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, CachedResponse};
pub use generations::Cache;
pub use queue::PendingReservation;
