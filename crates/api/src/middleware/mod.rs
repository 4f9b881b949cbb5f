//! Request middleware.
//!
//! - [`db_health::require_healthy_db`] -- rejects requests with 503 while the
//!   database is down.

pub mod db_health;
