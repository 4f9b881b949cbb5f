//! Webhook invocation.
//!
//! For every served query the invoker scans all registered webhooks,
//! atomically bumps the invocation counter of each one whose filters match
//! the query scope, and dispatches a notification whenever a counter reaches
//! a multiple of the webhook's threshold. Deliveries run detached on the
//! shared [`BackgroundTasks`] spawner.

use std::sync::Arc;

use renewables_core::renewables::YearRange;
use renewables_core::tasks::BackgroundTasks;
use renewables_core::types::IsoCode;
use renewables_core::webhook::Webhook;
use renewables_countries::CountryDirectory;
use renewables_db::repositories::WebhookRepo;
use renewables_db::{Database, DbResult};
use tokio::sync::broadcast;

use crate::bus::QueryEvent;
use crate::delivery::webhook::WebhookDelivery;

/// Outcome of one [`WebhookInvoker::invoke`] scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeSummary {
    /// Webhooks whose counter was incremented.
    pub matched: usize,
    /// Notifications dispatched.
    pub dispatched: usize,
}

pub struct WebhookInvoker {
    db: Database,
    countries: Arc<dyn CountryDirectory>,
    delivery: Arc<WebhookDelivery>,
    tasks: BackgroundTasks,
}

impl WebhookInvoker {
    pub fn new(
        db: Database,
        countries: Arc<dyn CountryDirectory>,
        delivery: Arc<WebhookDelivery>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            db,
            countries,
            delivery,
            tasks,
        }
    }

    /// Count a query over `countries` and `range` against every webhook.
    ///
    /// An empty `countries` slice means the query covered every country.
    pub async fn invoke(&self, countries: &[IsoCode], range: &YearRange) -> DbResult<InvokeSummary> {
        let mut summary = InvokeSummary::default();

        for webhook in WebhookRepo::list(&self.db).await? {
            if !webhook.matches(countries, range) {
                continue;
            }

            let Some(invocations) =
                WebhookRepo::increment_invocations(&self.db, &webhook.webhook_id).await?
            else {
                // Deleted between the scan and the increment.
                continue;
            };
            summary.matched += 1;

            if webhook.is_due(invocations) {
                summary.dispatched += 1;
                self.dispatch(webhook, invocations);
            }
        }

        tracing::debug!(
            countries = ?countries,
            begin = range.begin,
            end = range.end,
            matched = summary.matched,
            dispatched = summary.dispatched,
            "Webhooks invoked"
        );
        Ok(summary)
    }

    /// Run the invocation loop until the bus is dropped.
    pub async fn run(self: Arc<Self>, mut receiver: broadcast::Receiver<QueryEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.invoke(&event.countries, &event.range).await {
                        tracing::error!(
                            error = %e,
                            countries = ?event.countries,
                            "Failed to invoke webhooks"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Webhook invoker lagged, some queries were not counted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, webhook invoker shutting down");
                    break;
                }
            }
        }
    }

    /// Resolve the country name and POST the notification in the background.
    fn dispatch(&self, webhook: Webhook, invocations: i64) {
        let countries = Arc::clone(&self.countries);
        let delivery = Arc::clone(&self.delivery);

        self.tasks.spawn("webhook_delivery", async move {
            let country_name = match webhook.country_filter() {
                None => String::new(),
                Some(iso_code) => match countries.by_iso(iso_code).await {
                    Ok(country) => country.name,
                    Err(e) => {
                        tracing::warn!(
                            webhook_id = %webhook.webhook_id,
                            country = iso_code,
                            error = %e,
                            "Could not resolve webhook country, notification dropped"
                        );
                        return;
                    }
                },
            };

            let notification = webhook.notification(country_name, invocations);
            match delivery.deliver(&webhook.url, &notification).await {
                Ok(()) => tracing::info!(
                    webhook_id = %webhook.webhook_id,
                    calls = invocations,
                    "Webhook notified"
                ),
                Err(e) => tracing::warn!(
                    webhook_id = %webhook.webhook_id,
                    url = %webhook.url,
                    error = %e,
                    "Webhook notification failed"
                ),
            }
        });
    }
}
