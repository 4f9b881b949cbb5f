//! REST client for the REST Countries API (`https://restcountries.com/v3.1`).
//!
//! Every country fetched is kept in an in-memory cache keyed by ISO code. The
//! set of countries is small and fixed, so the cache is never evicted.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use renewables_core::country::Country;
use renewables_core::types::IsoCode;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::directory::{name_matches, CountryDirectory, CountryError};

#[derive(Debug, Deserialize)]
struct RestCountry {
    name: RestCountryName,
    cca3: String,
    #[serde(default)]
    borders: Vec<IsoCode>,
}

#[derive(Debug, Deserialize)]
struct RestCountryName {
    common: String,
}

impl From<RestCountry> for Country {
    fn from(c: RestCountry) -> Self {
        Country {
            name: c.name.common,
            iso_code: c.cca3,
            borders: c.borders,
        }
    }
}

pub struct RestCountriesClient {
    client: reqwest::Client,
    api_url: Url,
    cache: RwLock<HashMap<IsoCode, Country>>,
}

impl RestCountriesClient {
    /// Create a client with its own connection pool.
    ///
    /// * `api_url` - Base URL, e.g. `https://restcountries.com/v3.1`.
    /// * `timeout` - Upper bound for every request.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, CountryError> {
        let api_url = Url::parse(api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| CountryError::InvalidUrl(api_url.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Number of countries currently cached.
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    // ---- private helpers ----

    /// `GET {api_url}/{endpoint}/{lookup}` and cache the first result.
    ///
    /// `lookup` is percent-encoded as a single path segment.
    async fn fetch(&self, endpoint: &str, lookup: &str) -> Result<Country, CountryError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| CountryError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .push(endpoint)
            .push(lookup);
        tracing::debug!(url = %url, "Querying country API");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CountryError::NotFound(lookup.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CountryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let country: Country = response
            .json::<Vec<RestCountry>>()
            .await?
            .into_iter()
            .next()
            .map(Country::from)
            .ok_or_else(|| CountryError::NotFound(lookup.to_string()))?;

        self.cache
            .write()
            .await
            .insert(country.iso_code.clone(), country.clone());
        Ok(country)
    }
}

#[async_trait]
impl CountryDirectory for RestCountriesClient {
    async fn by_iso(&self, iso_code: &str) -> Result<Country, CountryError> {
        let iso_code = iso_code.to_uppercase();
        if let Some(country) = self.cache.read().await.get(&iso_code) {
            return Ok(country.clone());
        }
        self.fetch("alpha", &iso_code).await
    }

    async fn by_name(&self, name: &str) -> Result<Country, CountryError> {
        let cached = self
            .cache
            .read()
            .await
            .values()
            .find(|c| name_matches(c, name))
            .cloned();
        match cached {
            Some(country) => Ok(country),
            None => self.fetch("name", name.trim()).await,
        }
    }

    /// `HEAD` against the base URL.
    async fn probe(&self) -> Result<StatusCode, CountryError> {
        let response = self.client.head(self.api_url.clone()).send().await?;
        Ok(response.status())
    }
}
