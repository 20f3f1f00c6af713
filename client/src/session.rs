//! Client session cache.
//!
//! ARCHITECTURE
//! ============
//! `Session` is the single source of truth for "is a user signed in". State
//! lives behind a `tokio::sync::watch` channel so every consumer (the access
//! gate, views) observes a transition synchronously, before any redirect
//! decision is taken. An epoch counter stamps each transition; an async
//! check that started under an older epoch discards its result instead of
//! applying it.
//!
//! ERROR HANDLING
//! ==============
//! Validation never retries: any failure — rejection or transport — drops
//! the session to `Unauthenticated` and clears the persisted slot, so a
//! broken network fails closed rather than leaving a stale "signed in"
//! state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::api::{ApiError, AuthTransport, User};
use crate::token_store::{StoreError, TokenStore};

/// Session lifecycle. `Uninitialized` and `Loading` are transient; gates
/// must not evaluate against them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// A persisted token is being validated with the server.
    Loading,
    Authenticated {
        user: User,
        token: String,
    },
    Unauthenticated,
}

impl SessionState {
    /// True while no final authentication verdict exists yet.
    #[must_use]
    pub fn is_settling(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("not signed in")]
    NotSignedIn,
    /// A newer session transition landed while this check was in flight;
    /// its result was discarded rather than applied.
    #[error("superseded by a newer session change")]
    Superseded,
    #[error("token store error: {0}")]
    Store(#[from] StoreError),
}

/// Client-held session cache over a transport and a persisted token slot.
pub struct Session {
    transport: Arc<dyn AuthTransport>,
    store: Arc<dyn TokenStore>,
    tx: watch::Sender<SessionState>,
    epoch: AtomicU64,
}

impl Session {
    #[must_use]
    pub fn new(transport: Arc<dyn AuthTransport>, store: Arc<dyn TokenStore>) -> Self {
        let (tx, _) = watch::channel(SessionState::Uninitialized);
        Self { transport, store, tx, epoch: AtomicU64::new(0) }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state transitions. The receiver sees every change made
    /// after this call, plus the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply a transition and return the new epoch. `send_replace` notifies
    /// subscribers before this returns, which is what guarantees a sign-out
    /// is visible to the gate before any redirect decision.
    fn transition(&self, next: SessionState) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(next);
        epoch
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Resolve the persisted token, if any, into a session verdict. Runs
    /// once at process start.
    pub async fn initialize(&self) {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "token slot unreadable");
                None
            }
        };

        let Some(token) = token else {
            self.transition(SessionState::Unauthenticated);
            return;
        };

        let epoch = self.transition(SessionState::Loading);
        let result = self.transport.validate(&token).await;

        // A sign-in or sign-out that landed mid-validation wins.
        if self.current_epoch() != epoch {
            return;
        }

        match result {
            Ok(user) => {
                self.transition(SessionState::Authenticated { user, token });
            }
            Err(e) => {
                tracing::debug!(error = %e, "persisted token rejected; clearing");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "token slot clear failed");
                }
                self.transition(SessionState::Unauthenticated);
            }
        }
    }

    /// Create an account. When the server issues a token the session moves
    /// to `Authenticated`; when it withholds one (pending confirmation) the
    /// state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the transport or provider rejection; the session state does
    /// not change on failure.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let (user, token) = self.transport.sign_up(email, password).await?;
        if let Some(token) = token {
            self.persist_and_authenticate(user.clone(), token);
        }
        Ok(user)
    }

    /// Verify credentials and move to `Authenticated` from any state.
    ///
    /// # Errors
    ///
    /// Returns the transport or provider rejection; the session state does
    /// not change on failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let (user, token) = self.transport.sign_in(email, password).await?;
        self.persist_and_authenticate(user.clone(), token);
        Ok(user)
    }

    fn persist_and_authenticate(&self, user: User, token: String) {
        if let Err(e) = self.store.save(&token) {
            tracing::warn!(error = %e, "token slot write failed; session will not survive restart");
        }
        self.transition(SessionState::Authenticated { user, token });
    }

    /// End the session. The local state is cleared unconditionally and
    /// first; the server call is best-effort and its failure is only
    /// logged — a user who asked to sign out is signed out.
    pub async fn sign_out(&self) {
        let token = self.state().token().map(ToOwned::to_owned);

        self.transition(SessionState::Unauthenticated);
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "token slot clear failed");
        }

        if let Some(token) = token {
            if let Err(e) = self.transport.sign_out(&token).await {
                tracing::warn!(error = %e, "server signout failed; local session already cleared");
            }
        }
    }

    /// Ask the server whether the current identity holds `role`. The answer
    /// is never cached, so it is current as of the check.
    ///
    /// # Errors
    ///
    /// `NotSignedIn` without an authenticated session, `Superseded` when a
    /// state transition landed mid-check, or the transport failure — all of
    /// which callers treat as deny.
    pub async fn has_role(&self, role: &str) -> Result<bool, SessionError> {
        let SessionState::Authenticated { token, .. } = self.state() else {
            return Err(SessionError::NotSignedIn);
        };

        let epoch = self.current_epoch();
        let allowed = self.transport.check_role(&token, role).await?;

        if self.current_epoch() != epoch {
            return Err(SessionError::Superseded);
        }

        Ok(allowed)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
