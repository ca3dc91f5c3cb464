//! Client side of the BistroDelight offline worker.
//!
//! This crate provides the network fetch seam and the worker itself:
//! request routing, caching strategies, offline fallbacks, lifecycle,
//! background sync and push handling.

pub mod fetch;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, Fetcher, Request, Response, ResponseSource};
pub use worker::{
    ActivateReport, FetchOutcome, InstallReport, Notification, NotificationData, Notifier, PushPayload,
    ReservationQueue, RouteTable, ServiceWorker, Strategy, SyncReport, TracingNotifier, WorkerState,
};
