//! Country records and the response rows built from them.

use serde::{Deserialize, Serialize};

use crate::types::IsoCode;

/// A country as resolved through the country directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Common name, e.g. `"Norway"`.
    pub name: String,
    /// ISO 3166-1 alpha-3 code, e.g. `"NOR"`.
    pub iso_code: IsoCode,
    /// ISO codes of bordering countries.
    #[serde(default)]
    pub borders: Vec<IsoCode>,
}

/// One row of a renewables response.
///
/// `year` is absent when the row carries a mean over a year range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryOutput {
    pub name: String,
    pub iso_code: IsoCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_rows_omit_year() {
        let row = CountryOutput {
            name: "Norway".into(),
            iso_code: "NOR".into(),
            year: None,
            percentage: 68.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("year").is_none());
        assert_eq!(json["isoCode"], "NOR");
    }

    #[test]
    fn yearly_rows_carry_year_as_string() {
        let row = CountryOutput {
            name: "Norway".into(),
            iso_code: "NOR".into(),
            year: Some("2021".into()),
            percentage: 71.5,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["year"], "2021");
    }
}
