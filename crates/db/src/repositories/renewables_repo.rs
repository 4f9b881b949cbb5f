//! Repository for the `renewables` collection.
//!
//! One document per country, keyed by ISO code:
//! `{"name": "Norway", "1965": 62.1, ..., "2021": 71.5}`.

use std::collections::BTreeMap;

use renewables_core::constants::RENEWABLES_COLLECTION;
use renewables_core::renewables::RenewablesSeries;
use renewables_core::types::Year;
use serde_json::Value;

use crate::database::{Database, DbError, DbResult};
use crate::Document;

const NAME_FIELD: &str = "name";

pub struct RenewablesRepo;

impl RenewablesRepo {
    /// Series for one country, or `None` when the dataset has no entry for it.
    pub async fn find(db: &Database, iso_code: &str) -> DbResult<Option<RenewablesSeries>> {
        db.get(RENEWABLES_COLLECTION, iso_code)
            .await?
            .map(|doc| series_from_document(iso_code, &doc))
            .transpose()
    }

    /// Series for every country, ordered by ISO code.
    pub async fn list(db: &Database) -> DbResult<Vec<RenewablesSeries>> {
        db.list_all(RENEWABLES_COLLECTION)
            .await?
            .iter()
            .map(|(iso_code, doc)| series_from_document(iso_code, doc))
            .collect()
    }

    pub async fn exists(db: &Database, iso_code: &str) -> DbResult<bool> {
        db.exists(RENEWABLES_COLLECTION, iso_code).await
    }

    /// Create or replace a country's series.
    pub async fn upsert(db: &Database, series: &RenewablesSeries) -> DbResult<()> {
        db.set(RENEWABLES_COLLECTION, &series.iso_code, series_to_document(series))
            .await
    }
}

fn decode_error(iso_code: &str, reason: String) -> DbError {
    DbError::Decode {
        entity: "renewables",
        id: iso_code.to_string(),
        reason,
    }
}

fn series_from_document(iso_code: &str, doc: &Document) -> DbResult<RenewablesSeries> {
    let name = doc
        .get(NAME_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error(iso_code, "missing country name".into()))?
        .to_string();

    let mut percentages = BTreeMap::new();
    for (key, value) in doc.iter().filter(|(k, _)| k.as_str() != NAME_FIELD) {
        let year: Year = key
            .parse()
            .map_err(|_| decode_error(iso_code, format!("unexpected field {key:?}")))?;
        let percentage = value
            .as_f64()
            .ok_or_else(|| decode_error(iso_code, format!("year {year} is not a number")))?;
        percentages.insert(year, percentage);
    }

    Ok(RenewablesSeries {
        iso_code: iso_code.to_string(),
        name,
        percentages,
    })
}

fn series_to_document(series: &RenewablesSeries) -> Document {
    let mut doc = Document::new();
    doc.insert(NAME_FIELD.into(), series.name.clone().into());
    for (year, percentage) in &series.percentages {
        doc.insert(year.to_string(), (*percentage).into());
    }
    doc
}
