//! Core types and shared functionality for bistro-sw.
//!
//! This crate provides:
//! - Cache generation storage with SQLite backend
//! - Durable queue of offline reservations
//! - Unified error types
//! - Configuration structures and deploy-time constants

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;

pub use cache::{Cache, CacheDb, CacheEntry, CachedResponse, PendingReservation};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
