use std::sync::Arc;
use std::time::Instant;

use renewables_countries::CountryDirectory;
use renewables_db::cache::ResponseCache;
use renewables_db::Database;
use renewables_events::EventBus;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Health-gated document store.
    pub db: Database,
    /// Response cache for the data endpoints.
    pub cache: ResponseCache,
    /// Country name, ISO code and neighbour lookups.
    pub countries: Arc<dyn CountryDirectory>,
    /// Query events consumed by the webhook invoker.
    pub event_bus: Arc<EventBus>,
    /// Process start, for the uptime reported by `/status`.
    pub started_at: Instant,
}
