//! Year ranges and aggregation of per-year renewable shares.
//!
//! The store keeps one series per country (a map of year to percentage).
//! Handlers select a [`YearRange`] and an [`Aggregation`] and call
//! [`aggregate`] to turn the raw series into ordered [`CountryOutput`] rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{LATEST_YEAR, OLDEST_YEAR};
use crate::country::CountryOutput;
use crate::error::CoreError;
use crate::types::{IsoCode, Year};

// ---------------------------------------------------------------------------
// YearRange
// ---------------------------------------------------------------------------

/// Inclusive range of years a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub begin: Year,
    pub end: Year,
}

impl YearRange {
    /// Build a range from optional bounds, defaulting to the dataset bounds.
    ///
    /// Rejects bounds outside `[OLDEST_YEAR, LATEST_YEAR]` and ranges where
    /// `begin > end`.
    pub fn from_bounds(begin: Option<Year>, end: Option<Year>) -> Result<Self, CoreError> {
        let begin = begin.unwrap_or(OLDEST_YEAR);
        let end = end.unwrap_or(LATEST_YEAR);

        if begin < OLDEST_YEAR || end > LATEST_YEAR {
            return Err(CoreError::Validation(format!(
                "begin and end years have to be between {OLDEST_YEAR} and {LATEST_YEAR}"
            )));
        }
        if begin > end {
            return Err(CoreError::Validation(
                "begin year cannot be later than end year".into(),
            ));
        }

        Ok(Self { begin, end })
    }

    /// The single latest year of the dataset.
    pub fn current() -> Self {
        Self {
            begin: LATEST_YEAR,
            end: LATEST_YEAR,
        }
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.begin..=self.end).contains(&year)
    }
}

// ---------------------------------------------------------------------------
// RenewablesSeries
// ---------------------------------------------------------------------------

/// Renewable share of energy production per year for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct RenewablesSeries {
    pub iso_code: IsoCode,
    pub name: String,
    pub percentages: BTreeMap<Year, f64>,
}

impl RenewablesSeries {
    /// One row per year inside `range`, ordered by year.
    pub fn yearly(&self, range: &YearRange) -> Vec<CountryOutput> {
        self.percentages
            .range(range.begin..=range.end)
            .map(|(year, percentage)| CountryOutput {
                name: self.name.clone(),
                iso_code: self.iso_code.clone(),
                year: Some(year.to_string()),
                percentage: *percentage,
            })
            .collect()
    }

    /// A single row holding the mean over `range`, or `None` when the
    /// country has no data points in it.
    pub fn mean(&self, range: &YearRange) -> Option<CountryOutput> {
        let values: Vec<f64> = self
            .percentages
            .range(range.begin..=range.end)
            .map(|(_, p)| *p)
            .collect();

        if values.is_empty() {
            return None;
        }

        Some(CountryOutput {
            name: self.name.clone(),
            iso_code: self.iso_code.clone(),
            year: None,
            percentage: values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Shape of the rows produced per country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// One row per year.
    Yearly,
    /// One row per country holding the mean percentage.
    Mean,
}

/// Turn raw series into response rows.
///
/// Rows are grouped by ISO code (ascending) and ordered by year inside each
/// group. With `sort_by_value` the rows are then ordered by percentage,
/// highest first; ties keep the grouped order.
pub fn aggregate(
    series: &[RenewablesSeries],
    range: &YearRange,
    aggregation: Aggregation,
    sort_by_value: bool,
) -> Vec<CountryOutput> {
    let mut ordered: Vec<&RenewablesSeries> = series.iter().collect();
    ordered.sort_by(|a, b| a.iso_code.cmp(&b.iso_code));

    let mut rows: Vec<CountryOutput> = ordered
        .into_iter()
        .flat_map(|s| match aggregation {
            Aggregation::Yearly => s.yearly(range),
            Aggregation::Mean => s.mean(range).into_iter().collect(),
        })
        .collect();

    if sort_by_value {
        rows.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    }

    rows
}
