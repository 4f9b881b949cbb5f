//! Country directory: resolves ISO codes, names and neighbours.
//!
//! [`RestCountriesClient`] talks to the REST Countries HTTP API and caches
//! every country it has seen. [`StaticDirectory`] serves a fixed set of
//! countries without network access.

pub mod client;
pub mod directory;

pub use client::RestCountriesClient;
pub use directory::{CountryDirectory, CountryError, StaticDirectory};
