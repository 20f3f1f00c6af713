//! View gating for protected content.
//!
//! The gate never evaluates a transient session state: it waits until the
//! cache has settled, so protected content cannot flash before the verdict.
//! Callers render a neutral placeholder until `decide` resolves.

use crate::session::{Session, SessionState};

/// Outcome of a gate check for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the protected view.
    Authorized,
    /// Send the visitor to the sign-in page.
    RedirectToSignIn,
}

/// Wraps a protected view; `require_admin` additionally gates on the admin
/// role.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate {
    pub require_admin: bool,
}

impl AccessGate {
    #[must_use]
    pub fn new() -> Self {
        Self { require_admin: false }
    }

    #[must_use]
    pub fn admin_only() -> Self {
        Self { require_admin: true }
    }

    /// Resolve the gate for the current navigation. Suspends while the
    /// session is still settling; any failure to determine authorization
    /// denies.
    pub async fn decide(&self, session: &Session) -> GateDecision {
        let mut rx = session.subscribe();

        loop {
            if !rx.borrow().is_settling() {
                break;
            }
            // Sender gone means the session was torn down; deny.
            if rx.changed().await.is_err() {
                return GateDecision::RedirectToSignIn;
            }
        }

        let settled = rx.borrow().clone();
        match settled {
            SessionState::Authenticated { .. } if self.require_admin => {
                match session.has_role("admin").await {
                    Ok(true) => GateDecision::Authorized,
                    Ok(false) => GateDecision::RedirectToSignIn,
                    Err(e) => {
                        tracing::debug!(error = %e, "role check failed; denying");
                        GateDecision::RedirectToSignIn
                    }
                }
            }
            SessionState::Authenticated { .. } => GateDecision::Authorized,
            _ => GateDecision::RedirectToSignIn,
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
