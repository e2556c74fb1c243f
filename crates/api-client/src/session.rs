use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dcinv_api::{RefreshResponse, TokenPair};

use crate::error::ClientError;

/// Access/refresh credentials held for the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl From<TokenPair> for Credentials {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: Some(pair.refresh),
        }
    }
}

/// Key-value storage for the current credentials.
///
/// Implementations only store; refresh coordination lives in [`Session`].
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<Credentials>;
    fn set(&self, credentials: Credentials);
    fn clear(&self);
}

/// In-process store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemorySessionStore {
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            slot: Mutex::new(Some(credentials)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Credentials> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credentials: Credentials) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The logged-in session: a store plus the single-flight refresh gate.
///
/// Passed explicitly to the gateway; there is no global token state.
pub struct Session {
    store: Arc<dyn SessionStore>,
    refresh_gate: tokio::sync::Mutex<()>,
    refreshes: AtomicU64,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            refresh_gate: tokio::sync::Mutex::new(()),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.store.get()
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get().map(|c| c.access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get().and_then(|c| c.refresh)
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    /// Start a session from a fresh login.
    pub fn begin(&self, pair: TokenPair) {
        self.store.set(pair.into());
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of refresh requests this session has issued.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Obtain a usable access token after `rejected` got a 401.
    ///
    /// Callers queue on the refresh gate. The first one through calls
    /// `refresh`; the rest find the stored token already replaced and reuse
    /// it, so one expiry window costs exactly one refresh request. A failed
    /// refresh clears the session and every waiter gets `SessionExpired`.
    pub async fn refresh_after<F, Fut>(
        &self,
        rejected: &str,
        refresh: F,
    ) -> Result<String, ClientError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<RefreshResponse, ClientError>>,
    {
        let _gate = self.refresh_gate.lock().await;

        let Some(current) = self.store.get() else {
            debug!("session cleared while waiting for refresh");
            return Err(ClientError::SessionExpired);
        };
        if current.access != rejected {
            debug!("access token already refreshed by a concurrent caller");
            return Ok(current.access);
        }
        let Some(refresh_token) = current.refresh else {
            warn!("access token rejected and no refresh token stored; clearing session");
            self.store.clear();
            return Err(ClientError::SessionExpired);
        };

        self.refreshes.fetch_add(1, Ordering::SeqCst);
        info!("access token rejected; refreshing session");
        match refresh(refresh_token.clone()).await {
            Ok(resp) => {
                let access = resp.access.clone();
                self.store.set(Credentials {
                    access: resp.access,
                    refresh: Some(resp.refresh.unwrap_or(refresh_token)),
                });
                info!("session refreshed");
                Ok(access)
            }
            Err(err) => {
                warn!("token refresh failed ({err}); clearing session");
                self.store.clear();
                Err(ClientError::SessionExpired)
            }
        }
    }
}
