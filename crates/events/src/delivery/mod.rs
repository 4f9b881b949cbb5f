//! External delivery channels for webhook notifications.

pub mod webhook;
