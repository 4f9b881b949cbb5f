//! Domain building blocks for the renewables energy service.
//!
//! Everything in this crate is free of I/O apart from [`tasks`], which wraps
//! the tokio runtime for detached background work.
//!
//! - [`country`] -- country directory records and response rows.
//! - [`renewables`] -- year ranges and the aggregation of per-year shares.
//! - [`webhook`] -- webhook subscriptions, filter matching and ID generation.
//! - [`cache_key`] -- normalization of request keys for the response cache.
//! - [`tasks`] -- semaphore-bounded spawner for fire-and-forget work.

pub mod cache_key;
pub mod constants;
pub mod country;
pub mod error;
pub mod renewables;
pub mod tasks;
pub mod types;
pub mod webhook;
