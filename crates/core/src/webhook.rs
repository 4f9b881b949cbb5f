//! Webhook subscriptions.
//!
//! A webhook counts qualifying data queries and is notified every time the
//! running count reaches a multiple of its `calls` threshold. The counter is
//! never reset.

use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::renewables::YearRange;
use crate::types::{IsoCode, Year};

/// Country filter value meaning "any country".
pub const ANY_COUNTRY: &str = "ANY";

/// Length of generated webhook IDs.
pub const WEBHOOK_ID_LENGTH: usize = 16;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// A registered webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub webhook_id: String,
    pub url: String,
    /// ISO code the webhook listens to, or [`ANY_COUNTRY`].
    pub country: String,
    /// Notify every time `invocations` reaches a multiple of this.
    pub calls: i64,
    /// Running count of qualifying queries.
    pub invocations: i64,
    /// Only queries whose year range contains this year qualify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
}

impl Webhook {
    /// The specific country this webhook is filtered on, if any.
    pub fn country_filter(&self) -> Option<&str> {
        (self.country != ANY_COUNTRY).then_some(self.country.as_str())
    }

    /// Whether a query over `countries` and `range` qualifies for this webhook.
    ///
    /// An empty `countries` slice means the query covered every country.
    pub fn matches(&self, countries: &[IsoCode], range: &YearRange) -> bool {
        if let Some(filter) = self.country_filter() {
            if !countries.is_empty() && !countries.iter().any(|c| c == filter) {
                return false;
            }
        }

        match self.year {
            Some(year) => range.contains(year),
            None => true,
        }
    }

    /// Whether reaching `invocations` triggers a notification.
    pub fn is_due(&self, invocations: i64) -> bool {
        self.calls > 0 && invocations > 0 && invocations % self.calls == 0
    }

    /// Build the payload posted to the webhook URL.
    ///
    /// `country_name` is the resolved name of the filtered country, or empty
    /// when the webhook listens to any country.
    pub fn notification(&self, country_name: String, invocations: i64) -> WebhookNotification {
        WebhookNotification {
            webhook_id: self.webhook_id.clone(),
            country: country_name,
            calls: invocations,
            year: self.year,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Registration request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWebhook {
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[serde(default)]
    pub country: Option<String>,
    #[validate(range(min = 1, message = "calls must be at least 1"))]
    pub calls: i64,
    #[serde(default)]
    pub year: Option<Year>,
}

impl CreateWebhook {
    /// Upper-cased ISO filter, or [`ANY_COUNTRY`] when none was given.
    pub fn country_filter(&self) -> String {
        match self.country.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_uppercase(),
            _ => ANY_COUNTRY.to_string(),
        }
    }

    /// Year filter; non-positive years mean "no filter".
    pub fn year_filter(&self) -> Option<Year> {
        self.year.filter(|y| *y > 0)
    }
}

/// Payload posted to a webhook URL when its threshold is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub webhook_id: String,
    pub country: String,
    pub calls: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
}

/// Generate a random webhook ID of upper- and lower-case ASCII letters.
pub fn generate_webhook_id() -> String {
    let mut rng = rand::rng();
    (0..WEBHOOK_ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
