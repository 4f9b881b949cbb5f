//! The [`CountryDirectory`] abstraction and an in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use renewables_core::country::Country;
use renewables_core::types::IsoCode;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CountryError {
    /// The directory has no country matching the lookup.
    #[error("Country not found: {0}")]
    NotFound(String),

    /// The HTTP request itself failed (network, DNS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The directory API answered with an unexpected status.
    #[error("Country API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid country API URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait CountryDirectory: Send + Sync {
    /// Look up a country by ISO 3166-1 alpha-3 code.
    async fn by_iso(&self, iso_code: &str) -> Result<Country, CountryError>;

    /// Look up a country by (part of) its name, case-insensitively.
    async fn by_name(&self, name: &str) -> Result<Country, CountryError>;

    /// ISO codes of the countries bordering `iso_code`.
    async fn neighbours(&self, iso_code: &str) -> Result<Vec<IsoCode>, CountryError> {
        Ok(self.by_iso(iso_code).await?.borders)
    }

    /// Reachability of the directory, reported as an HTTP status.
    async fn probe(&self) -> Result<StatusCode, CountryError>;
}

/// Case-insensitive substring match on country names.
pub(crate) fn name_matches(country: &Country, needle: &str) -> bool {
    country
        .name
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

/// Directory over a fixed set of countries.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    countries: BTreeMap<IsoCode, Country>,
}

impl StaticDirectory {
    pub fn new(countries: impl IntoIterator<Item = Country>) -> Self {
        Self {
            countries: countries
                .into_iter()
                .map(|c| (c.iso_code.clone(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl CountryDirectory for StaticDirectory {
    async fn by_iso(&self, iso_code: &str) -> Result<Country, CountryError> {
        self.countries
            .get(&iso_code.to_uppercase())
            .cloned()
            .ok_or_else(|| CountryError::NotFound(iso_code.to_string()))
    }

    async fn by_name(&self, name: &str) -> Result<Country, CountryError> {
        self.countries
            .values()
            .find(|c| name_matches(c, name))
            .cloned()
            .ok_or_else(|| CountryError::NotFound(name.to_string()))
    }

    async fn probe(&self) -> Result<StatusCode, CountryError> {
        Ok(StatusCode::OK)
    }
}
