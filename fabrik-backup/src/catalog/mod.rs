//! Backup catalog module.
//!
//! Per-tenant backup metadata lives in one container, encrypted archives in a
//! second ("blueprint") container. The two are one logical unit but are never
//! written or removed atomically.
//!
//! # Architecture
//!
//! - [`BackupKey`]: Storage key codec for metadata objects
//! - [`Platform`]: Normalized platform hint
//! - [`TenantAuthorizer`]: Tenant access check, [`CloudControllerAuthorizer`] in production
//! - [`BackupCatalog`]: list / get / delete / put over an [`ObjectStore`](blob_store::ObjectStore)

mod authorizer;
mod error;
mod key;
mod platform;
mod record;
mod service;

pub use authorizer::{CloudControllerAuthorizer, TenantAuthorizer};
pub use error::CatalogError;
pub use key::{
    BackupKey, KeyError, archive_key, archive_prefix, format_started_at, parse_started_at,
    tenant_prefix,
};
pub use platform::Platform;
pub use record::{BackupRecord, BackupState};
pub use service::BackupCatalog;
