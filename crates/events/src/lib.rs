//! Query events and webhook notification.
//!
//! - [`EventBus`] -- in-process fan-out of [`QueryEvent`]s, published by the
//!   data endpoints on every served query.
//! - [`WebhookInvoker`] -- consumes query events, counts them against every
//!   matching webhook and dispatches a notification when a threshold is hit.
//! - [`delivery`] -- HTTP delivery of notifications to webhook URLs.

pub mod bus;
pub mod delivery;
pub mod invoker;

pub use bus::{EventBus, QueryEvent};
pub use delivery::webhook::{WebhookDelivery, WebhookError};
pub use invoker::{InvokeSummary, WebhookInvoker};
