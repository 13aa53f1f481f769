//! fabrik-backup library crate.
//!
//! Backup catalog for service brokers together with the credential lifecycle
//! of the broker's own identity-provider account.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
