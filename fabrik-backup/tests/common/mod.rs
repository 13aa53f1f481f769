//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use blob_store::{MemoryStore, ObjectStore, StorageError, StorageResult};
use bytes::Bytes;
use fabrik_backup::catalog::{CatalogError, Platform, TenantAuthorizer};
use fabrik_backup::credentials::{CredentialError, IdentityProvider, TokenPayload};
use parking_lot::Mutex;

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// What a fake grant answers with.
#[derive(Debug, Clone)]
pub enum Grant {
    Issue {
        expires_in: i64,
        refresh_expires_in: i64,
    },
    Fail(CredentialError),
}

impl Grant {
    pub fn issue(expires_in: i64, refresh_expires_in: i64) -> Self {
        Self::Issue {
            expires_in,
            refresh_expires_in,
        }
    }
}

/// Identity provider that counts calls and mints tokens named after the grant.
///
/// Password grants return `password-{n}`, refresh grants `refresh-{n}`.
pub struct FakeIdentityProvider {
    password_grant: Mutex<Grant>,
    refresh_grant: Mutex<Grant>,
    password_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    delay: Duration,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            password_grant: Mutex::new(Grant::issue(3600, 86400)),
            refresh_grant: Mutex::new(Grant::issue(3600, 86400)),
            password_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_password_grant(self, grant: Grant) -> Self {
        *self.password_grant.lock() = grant;
        self
    }

    pub fn with_refresh_grant(self, grant: Grant) -> Self {
        *self.refresh_grant.lock() = grant;
        self
    }

    pub fn password_calls(&self) -> usize {
        self.password_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, grant: Grant, name: &str, n: usize) -> Result<TokenPayload, CredentialError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match grant {
            Grant::Issue {
                expires_in,
                refresh_expires_in,
            } => Ok(TokenPayload::new(
                format!("{name}-{n}"),
                expires_in,
                format!("{name}-refresh-{n}"),
                refresh_expires_in,
            )),
            Grant::Fail(e) => Err(e),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn access_with_password(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<TokenPayload, CredentialError> {
        let n = self.password_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let grant = self.password_grant.lock().clone();
        self.answer(grant, "password", n).await
    }

    async fn access_with_refresh_token(
        &self,
        _refresh_token: &str,
    ) -> Result<TokenPayload, CredentialError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let grant = self.refresh_grant.lock().clone();
        self.answer(grant, "refresh", n).await
    }
}

/// Store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Delete,
}

/// Object store that counts every mutating call before delegating to memory.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    deleted: Mutex<Vec<(String, String)>>,
    failing: Mutex<Vec<(String, StoreOp)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `op` on `container` fail with an I/O error.
    pub fn fail(&self, container: &str, op: StoreOp) {
        self.failing.lock().push((container.to_string(), op));
    }

    fn check(&self, container: &str, op: StoreOp) -> StorageResult<()> {
        let failing = self.failing.lock();
        if failing.iter().any(|(c, o)| c == container && *o == op) {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "{op:?} failed on {container}"
            ))));
        }
        Ok(())
    }

    /// Number of put and delete calls so far, successful or not.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// `(container, key)` of every successful delete, in call order.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().clone()
    }

    pub fn contains(&self, container: &str, key: &str) -> bool {
        self.inner.contains(container, key)
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn list_keys(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>> {
        self.check(container, StoreOp::List)?;
        self.inner.list_keys(container, prefix).await
    }

    async fn get_object(&self, container: &str, key: &str) -> StorageResult<Bytes> {
        self.inner.get_object(container, key).await
    }

    async fn put_object(&self, container: &str, key: &str, data: Bytes) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_object(container, key, data).await
    }

    async fn delete_object(&self, container: &str, key: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check(container, StoreOp::Delete)?;
        self.inner.delete_object(container, key).await?;
        self.deleted
            .lock()
            .push((container.to_string(), key.to_string()));
        Ok(())
    }
}

/// Authorizer that allows a fixed set of tenants and records every check.
#[derive(Default)]
pub struct FakeAuthorizer {
    allowed: HashSet<String>,
    calls: Mutex<Vec<(String, Platform)>>,
}

impl FakeAuthorizer {
    pub fn allowing(tenants: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            allowed: tenants.iter().map(|t| t.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Platform)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TenantAuthorizer for FakeAuthorizer {
    async fn authorize(&self, tenant: &str, platform: Platform) -> Result<(), CatalogError> {
        self.calls.lock().push((tenant.to_string(), platform));
        if self.allowed.contains(tenant) {
            Ok(())
        } else {
            Err(CatalogError::forbidden(tenant, "not a space developer"))
        }
    }
}
