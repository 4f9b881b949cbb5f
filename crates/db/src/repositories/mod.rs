//! Typed repositories over the document store.
//!
//! Each repository is a zero-sized struct whose associated functions take the
//! [`Database`](crate::Database) handle, and convert between stored documents
//! and domain types.

pub mod renewables_repo;
pub mod webhook_repo;

pub use renewables_repo::RenewablesRepo;
pub use webhook_repo::WebhookRepo;
