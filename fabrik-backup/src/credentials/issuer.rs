//! Credential lifecycle for the broker's own identity-provider account.
//!
//! [`TokenIssuer`] holds exactly one current [`Credential`] and at most one
//! pending background renewal. Callers only ever ask for an access token; the
//! issuer decides between the cached token, a refresh-token grant and a full
//! password login.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Notify, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::UaaConfig;

use super::error::CredentialError;
use super::provider::IdentityProvider;
use super::types::{Credential, EXPIRY_GRACE_SECS, TokenPayload};

/// Largest delay the tokio timer wheel accepts (about 2.2 years).
pub const MAX_RENEWAL_DELAY_SECS: i64 = 68_719_476;

/// Delay before the background renewal for a token expiring in `expires_in` seconds.
///
/// `None` when the delay is not positive or not representable; the next
/// on-demand call renews the credential instead.
pub fn renewal_delay(expires_in: i64) -> Option<Duration> {
    let delay = expires_in.saturating_sub(EXPIRY_GRACE_SECS);
    if delay > 0 && delay < MAX_RENEWAL_DELAY_SECS {
        Some(Duration::from_secs(delay as u64))
    } else {
        None
    }
}

type RenewalResult = Result<String, CredentialError>;

/// One renewal shared by every caller that observed an expiring token.
struct InFlightRenewal {
    result: OnceCell<RenewalResult>,
    notify: Notify,
}

impl InFlightRenewal {
    fn new() -> Self {
        Self {
            result: OnceCell::new(),
            notify: Notify::new(),
        }
    }

    fn set_result(&self, result: RenewalResult) {
        let _ = self.result.set(result);
        self.notify.notify_waiters();
    }

    async fn wait(&self) -> RenewalResult {
        loop {
            if let Some(result) = self.result.get() {
                return result.clone();
            }

            let notified = self.notify.notified();
            if let Some(result) = self.result.get() {
                return result.clone();
            }

            notified.await;
        }
    }
}

/// Handle of the single pending background renewal.
struct RenewalTimer {
    id: u64,
    cancel: CancellationToken,
}

struct Shared {
    provider: Arc<dyn IdentityProvider>,
    username: String,
    password: String,
    credential: RwLock<Credential>,
    /// Bumped on logout; renewals started before a logout never install their result.
    epoch: AtomicU64,
    timer_seq: AtomicU64,
    timer: Mutex<Option<RenewalTimer>>,
    in_flight: Mutex<Option<Arc<InFlightRenewal>>>,
}

/// Keeps a long-lived client authorized against the identity provider.
///
/// Cloning is cheap and every clone shares the same credential and timer.
/// Construct one at the composition root and pass it to whoever needs a token.
#[derive(Clone)]
pub struct TokenIssuer {
    shared: Arc<Shared>,
}

impl TokenIssuer {
    /// Create an unauthenticated issuer.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                username: username.into(),
                password: password.into(),
                credential: RwLock::new(Credential::empty()),
                epoch: AtomicU64::new(0),
                timer_seq: AtomicU64::new(0),
                timer: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(provider: Arc<dyn IdentityProvider>, config: &UaaConfig) -> Self {
        Self::new(provider, config.username.clone(), config.password.clone())
    }

    /// Snapshot of the current credential.
    pub fn credential(&self) -> Credential {
        self.shared.credential.read().clone()
    }

    /// Whether a background renewal is scheduled and not yet started or cancelled.
    pub fn has_pending_renewal(&self) -> bool {
        self.shared
            .timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.cancel.is_cancelled())
    }

    /// Primary authentication with the configured account.
    #[instrument(skip(self), fields(username = %self.shared.username))]
    pub async fn login(&self) -> Result<TokenPayload, CredentialError> {
        debug!("Logging in to identity provider");
        self.shared
            .provider
            .access_with_password(&self.shared.username, &self.shared.password)
            .await
    }

    /// Exchange the current refresh token for a new token pair.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<TokenPayload, CredentialError> {
        let (refresh_token, expires_in) = {
            let credential = self.shared.credential.read();
            (
                credential.refresh_token().to_string(),
                credential.access_token_expires_in(Utc::now()),
            )
        };
        trace!(
            access_token_expires_in = expires_in,
            "Refreshing access token"
        );
        self.shared
            .provider
            .access_with_refresh_token(&refresh_token)
            .await
    }

    /// Replace the current credential and reschedule the background renewal.
    pub fn update_credential(&self, payload: &TokenPayload) -> Credential {
        self.install(payload, None)
            .unwrap_or_else(|| self.credential())
    }

    /// Return a usable access token, renewing the credential when it expires soon.
    ///
    /// Concurrent callers that all observe an expiring token share one renewal.
    #[instrument(skip(self))]
    pub async fn get_access_token(&self) -> Result<String, CredentialError> {
        if let Some(token) = self.cached_access_token() {
            return Ok(token);
        }

        let renewal = {
            let mut slot = self.shared.in_flight.lock();

            // Another caller may have finished a renewal since the first check.
            if let Some(token) = self.cached_access_token() {
                return Ok(token);
            }

            match slot.as_ref() {
                Some(existing) => {
                    trace!("Joining in-flight credential renewal");
                    existing.clone()
                }
                None => {
                    let renewal = Arc::new(InFlightRenewal::new());
                    *slot = Some(renewal.clone());
                    self.spawn_renewal(renewal.clone());
                    renewal
                }
            }
        };

        renewal.wait().await
    }

    /// Cancel the pending renewal and forget the credential.
    pub fn logout(&self) {
        {
            // Lock order: timer, then credential. Holding the timer slot while
            // bumping the epoch keeps a concurrent install from arming a new timer.
            let mut timer = self.shared.timer.lock();
            if let Some(timer) = timer.take() {
                timer.cancel.cancel();
            }

            let mut credential = self.shared.credential.write();
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            *credential = Credential::empty();
        }

        if let Some(renewal) = self.shared.in_flight.lock().take() {
            renewal.set_result(Err(CredentialError::unauthorized(
                "logged out while renewing the credential",
            )));
        }

        info!("Logged out of identity provider");
    }

    fn cached_access_token(&self) -> Option<String> {
        let credential = self.shared.credential.read();
        if credential.access_token_expires_soon() {
            None
        } else {
            Some(credential.access_token().to_string())
        }
    }

    /// Run the renewal in its own task so a caller dropping its future
    /// cannot strand the other waiters.
    fn spawn_renewal(&self, renewal: Arc<InFlightRenewal>) {
        let issuer = self.clone();
        tokio::spawn(async move {
            let result = issuer.renew().await;

            {
                let mut slot = issuer.shared.in_flight.lock();
                if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &renewal)) {
                    *slot = None;
                }
            }

            renewal.set_result(result);
        });
    }

    /// Refresh when the refresh token is healthy, otherwise (or on failure) log in.
    async fn renew(&self) -> RenewalResult {
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let refresh_usable = !self.shared.credential.read().refresh_token_expires_soon();

        let payload = if refresh_usable {
            match self.refresh().await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Credential refresh failed, falling back to login");
                    self.login().await?
                }
            }
        } else {
            debug!("Refresh token expires soon, login required");
            self.login().await?
        };

        self.install(&payload, Some(epoch))
            .map(|credential| credential.access_token().to_string())
            .ok_or_else(|| {
                CredentialError::unauthorized("logged out while renewing the credential")
            })
    }

    /// Install `payload` as the current credential.
    ///
    /// With `expected_epoch`, nothing is installed if a logout happened since.
    fn install(&self, payload: &TokenPayload, expected_epoch: Option<u64>) -> Option<Credential> {
        let now = Utc::now();
        let credential = Credential::from_payload(payload, now);

        let epoch = {
            let mut current = self.shared.credential.write();
            let epoch = self.shared.epoch.load(Ordering::SeqCst);
            if expected_epoch.is_some_and(|expected| expected != epoch) {
                debug!("Discarding credential obtained before logout");
                return None;
            }
            *current = credential.clone();
            epoch
        };

        let expires_in = credential.access_token_expires_in(now);
        match renewal_delay(expires_in) {
            Some(delay) => self.schedule_renewal(delay, epoch),
            None => debug!(
                access_token_expires_in = expires_in,
                "Not scheduling background renewal"
            ),
        }

        Some(credential)
    }

    fn schedule_renewal(&self, delay: Duration, epoch: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, background renewal not scheduled");
            return;
        };

        let id = self.shared.timer_seq.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        {
            let mut slot = self.shared.timer.lock();
            if self.shared.epoch.load(Ordering::SeqCst) != epoch {
                debug!("Logged out before the renewal was armed, not scheduling");
                return;
            }
            if let Some(previous) = slot.replace(RenewalTimer {
                id,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
            }
        }

        debug!(delay_secs = delay.as_secs(), "Scheduled background credential renewal");

        let weak = Arc::downgrade(&self.shared);
        runtime.spawn(background_renewal(weak, id, cancel, delay, epoch));
    }
}

/// Timer body: refresh once, install on success, log on failure.
///
/// Never retries and never falls back to login; the stale credential stays
/// in place until a later renewal replaces it.
async fn background_renewal(
    shared: Weak<Shared>,
    id: u64,
    cancel: CancellationToken,
    delay: Duration,
    epoch: u64,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            trace!("Background credential renewal cancelled");
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let Some(shared) = shared.upgrade() else {
        return;
    };
    let issuer = TokenIssuer { shared };

    {
        let mut slot = issuer.shared.timer.lock();
        if slot.as_ref().is_some_and(|timer| timer.id == id) {
            *slot = None;
        }
    }

    if issuer.shared.in_flight.lock().is_some() {
        debug!("Renewal already in flight, skipping background refresh");
        return;
    }

    let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = issuer.refresh() => result,
    };

    match result {
        Ok(payload) => {
            if issuer.install(&payload, Some(epoch)).is_some() {
                info!("Background credential renewal succeeded");
            }
        }
        Err(e) => {
            error!(error = %e, "Background credential renewal failed");
        }
    }
}
