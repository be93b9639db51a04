pub mod claims;
pub mod storage;

pub use claims::decode_claims;
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StorageError};

use std::fmt;
use std::sync::{Arc, Mutex};

use shared::types::{AccessClaims, TokenPair};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::error::AuthError;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in principal: credential pair plus the claims decoded from the
/// access token. The claims are only ever produced by decoding `tokens.access`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    tokens: TokenPair,
    claims: AccessClaims,
}

impl Session {
    pub fn from_tokens(tokens: TokenPair) -> Result<Self, AuthError> {
        let claims = decode_claims(&tokens.access)?;
        Ok(Self { tokens, claims })
    }

    pub fn access(&self) -> &str {
        &self.tokens.access
    }

    pub fn refresh(&self) -> &str {
        &self.tokens.refresh
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    pub fn claims(&self) -> &AccessClaims {
        &self.claims
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn is_elevated(&self) -> bool {
        self.claims.is_elevated()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Lifecycle notifications. `LoginRequired` is the signal for the shell to
/// navigate to the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Established { username: String },
    Refreshed { username: String },
    Cleared,
    LoginRequired { reason: String },
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Process-wide owner of the current session.
///
/// Cheap to clone; all clones share the same slot. The in-memory session
/// and the durable slot are updated together under one write lock, durable
/// side first.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn CredentialStore>,
    current: watch::Sender<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn CredentialStore>) -> Self {
        let (current, _) = watch::channel(None);
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                current,
                events,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Load the persisted pair, if any. A missing, unreadable or undecodable
    /// slot leaves the store empty; a corrupt slot is also erased.
    pub fn hydrate(&self) -> Option<AccessClaims> {
        let _guard = self.write_guard();

        let tokens = match self.inner.storage.load() {
            Ok(Some(tokens)) => tokens,
            Ok(None) => {
                debug!("No persisted session");
                self.inner.current.send_replace(None);
                return None;
            }
            Err(e) => {
                warn!("Persisted session unreadable, starting signed out: {}", e);
                self.erase_slot();
                self.inner.current.send_replace(None);
                return None;
            }
        };

        match Session::from_tokens(tokens) {
            Ok(session) => {
                let claims = session.claims().clone();
                info!("Session restored for {}", claims.username);
                self.inner.current.send_replace(Some(session));
                Some(claims)
            }
            Err(e) => {
                warn!("Persisted session rejected, starting signed out: {}", e);
                self.erase_slot();
                self.inner.current.send_replace(None);
                None
            }
        }
    }

    /// Decode `access`, persist the pair, then publish it in memory.
    pub fn establish(
        &self,
        access: impl Into<String>,
        refresh: impl Into<String>,
    ) -> Result<Session, AuthError> {
        let session = Session::from_tokens(TokenPair::new(access, refresh))?;
        let _guard = self.write_guard();
        self.install(session)
    }

    /// Replace the access token of the session holding `refresh`.
    ///
    /// Fails with `SessionChanged`, leaving the store untouched, when that
    /// session has been cleared or replaced in the meantime.
    pub fn establish_if_current(
        &self,
        refresh: &str,
        access: impl Into<String>,
    ) -> Result<Session, AuthError> {
        let session = Session::from_tokens(TokenPair::new(access, refresh))?;
        let _guard = self.write_guard();
        if !self.holds(refresh) {
            debug!("Discarding refreshed token: session changed");
            return Err(AuthError::SessionChanged);
        }
        self.install(session)
    }

    /// Erase the durable slot and the in-memory session.
    pub fn clear(&self) {
        {
            let _guard = self.write_guard();
            self.erase_slot();
            self.inner.current.send_replace(None);
        }
        info!("Session cleared");
        let _ = self.inner.events.send(SessionEvent::Cleared);
    }

    /// Clear the session and tell the shell to show the login screen.
    pub fn force_login(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Session terminated: {}", reason);
        self.clear();
        let _ = self.inner.events.send(SessionEvent::LoginRequired { reason });
    }

    /// `force_login`, but only while the session holding `refresh` is still
    /// the current one. Returns whether it was torn down.
    pub fn force_login_if_current(&self, refresh: &str, reason: impl Into<String>) -> bool {
        {
            let _guard = self.write_guard();
            if !self.holds(refresh) {
                debug!("Session changed since the refresh started; keeping it");
                return false;
            }
            self.erase_slot();
            self.inner.current.send_replace(None);
        }
        let reason = reason.into();
        warn!("Session terminated: {}", reason);
        let _ = self.inner.events.send(SessionEvent::Cleared);
        let _ = self.inner.events.send(SessionEvent::LoginRequired { reason });
        true
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.current.borrow().clone()
    }

    pub fn claims(&self) -> Option<AccessClaims> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .map(|s| s.claims().clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .map(|s| s.access().to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.current.borrow().is_some()
    }

    pub fn is_elevated(&self) -> bool {
        self.inner
            .current
            .borrow()
            .as_ref()
            .is_some_and(Session::is_elevated)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Watch the session itself rather than its events.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.inner.current.subscribe()
    }

    /// Persist and publish `session`. Caller holds the write lock.
    fn install(&self, session: Session) -> Result<Session, AuthError> {
        self.inner
            .storage
            .save(session.tokens())
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let previous = self.inner.current.send_replace(Some(session.clone()));
        let username = session.username().to_string();
        let event = match previous {
            Some(prev) if prev.refresh() == session.refresh() => {
                debug!("Access token replaced for {}", username);
                SessionEvent::Refreshed { username }
            }
            _ => {
                info!("Session established for {}", username);
                SessionEvent::Established { username }
            }
        };
        let _ = self.inner.events.send(event);

        Ok(session)
    }

    fn holds(&self, refresh: &str) -> bool {
        self.inner
            .current
            .borrow()
            .as_ref()
            .is_some_and(|s| s.refresh() == refresh)
    }

    fn erase_slot(&self) {
        if let Err(e) = self.inner.storage.clear() {
            warn!("Failed to erase persisted session: {}", e);
        }
    }

    fn write_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &*self.inner.current.borrow())
            .finish()
    }
}
