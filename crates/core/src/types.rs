/// Three-letter ISO 3166-1 alpha-3 country code (e.g. `"NOR"`).
pub type IsoCode = String;

/// A calendar year in the renewables dataset.
pub type Year = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
