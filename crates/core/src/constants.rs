//! Service-wide constants.

use std::time::Duration;

use crate::types::Year;

/// Public API version, reported by the status endpoint.
pub const VERSION: &str = "v1";

/// Prefix under which every service endpoint is mounted.
pub const SERVICE_PATH: &str = "/energy/v1";

/// First year present in the renewables dataset.
pub const OLDEST_YEAR: Year = 1965;

/// Latest year present in the renewables dataset ("current" data).
pub const LATEST_YEAR: Year = 2021;

/// Collection holding one document per country, keyed by ISO code.
pub const RENEWABLES_COLLECTION: &str = "renewables";

/// Collection holding registered webhooks, keyed by webhook ID.
pub const WEBHOOKS_COLLECTION: &str = "webhooks";

/// Collection holding cached responses, keyed by hashed request key.
pub const CACHE_COLLECTION: &str = "cache";

/// Cached responses older than this are treated as absent.
pub const MAX_CACHE_AGE: Duration = Duration::from_secs(4 * 60 * 60);

/// Interval between database reconnect attempts while the store is down.
pub const DB_RECONNECT_INTERVAL: Duration = Duration::from_secs(60);
