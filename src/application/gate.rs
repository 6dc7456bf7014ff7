//! Access gate: decides whether the session may see the admin dashboard.
//!
//! The gate compares the credential held in the session store against the
//! configured passkey. A correct passkey is obfuscated with
//! [`credential::encode`] and written to the `accessKey` slot, so later
//! protected navigations in the same session open without prompting.
//!
//! ```text
//! Closed --correct key--> Open
//! Closed --wrong key----> Closed (+ error, no store write)
//! Open ---slot removed---> Closed
//! ```

use std::sync::Arc;

use crate::domain::credential;
use crate::domain::{PassKey, Route};
use crate::ports::SessionStore;

/// Session slot holding the obfuscated credential.
pub const ACCESS_KEY_SLOT: &str = "accessKey";

/// Maximum passkey length accepted by the prompt.
pub const PASSKEY_LENGTH: usize = 6;

/// Authorization failure.
///
/// Wrong and missing keys share one message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Invalid passKey. Please try again.")]
    InvalidPassKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Closed,
    Open,
}

/// Outcome of evaluating a protected route load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Stored credential is valid: navigate without prompting.
    Granted(Route),
    /// Show the passkey modal over the current screen.
    Prompt,
}

/// The admin access gate.
pub struct AccessGate<S: SessionStore> {
    store: Arc<S>,
    expected: Option<PassKey>,
    state: GateState,
    prompt_open: bool,
}

impl<S: SessionStore> AccessGate<S> {
    /// Create a gate over `store`. With no `expected` passkey the gate never opens.
    pub fn new(store: Arc<S>, expected: Option<PassKey>) -> Self {
        let gate = Self {
            store,
            expected,
            state: GateState::Closed,
            prompt_open: false,
        };
        match &gate.expected {
            None => tracing::warn!("No admin passkey configured; admin dashboard is unreachable"),
            Some(_) if !gate.is_reachable() => tracing::warn!(
                "Admin passkey is longer than {} characters and cannot be entered; \
                 admin dashboard is unreachable",
                PASSKEY_LENGTH
            ),
            Some(_) => {}
        }
        gate
    }

    /// Whether the configured passkey can be typed into the prompt.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.expected
            .as_ref()
            .is_some_and(|key| key.expose().chars().count() <= PASSKEY_LENGTH)
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub fn is_prompt_open(&self) -> bool {
        self.prompt_open
    }

    /// Whether a stored (obfuscated) session token decodes to the expected passkey.
    #[must_use]
    pub fn is_authorized(&self, session_token: Option<&str>) -> bool {
        let (Some(expected), Some(token)) = (&self.expected, session_token) else {
            return false;
        };
        match credential::decode(token) {
            Ok(key) => expected.matches(key.expose()),
            Err(e) => {
                tracing::debug!("Ignoring stored credential: {}", e);
                false
            }
        }
    }

    /// Re-check the session store on a protected route load.
    pub fn evaluate(&mut self) -> GateDecision {
        let token = self.store.get(ACCESS_KEY_SLOT);
        if self.is_authorized(token.as_deref()) {
            self.state = GateState::Open;
            self.prompt_open = false;
            GateDecision::Granted(Route::Admin)
        } else {
            self.state = GateState::Closed;
            self.prompt_open = true;
            GateDecision::Prompt
        }
    }

    /// Check a candidate passkey entered in the prompt.
    ///
    /// # Errors
    /// Returns [`GateError::InvalidPassKey`] unless the candidate equals the
    /// configured passkey exactly. Nothing is written on failure.
    pub fn authorize(&mut self, candidate: &str) -> Result<Route, GateError> {
        let matches = self
            .expected
            .as_ref()
            .is_some_and(|expected| expected.matches(candidate));
        if !matches {
            tracing::info!("Admin passkey rejected");
            self.state = GateState::Closed;
            return Err(GateError::InvalidPassKey);
        }

        self.store.set(ACCESS_KEY_SLOT, credential::encode(candidate));
        self.state = GateState::Open;
        self.prompt_open = false;
        tracing::info!("Admin access granted");
        Ok(Route::Admin)
    }

    /// Dismiss the prompt and head back to the landing page.
    ///
    /// Stored credentials are left untouched.
    pub fn revoke(&mut self) -> Route {
        self.prompt_open = false;
        Route::Home
    }

    /// End the admin session by removing the stored credential.
    pub fn lock(&mut self) -> Route {
        self.store.remove(ACCESS_KEY_SLOT);
        self.state = GateState::Closed;
        self.prompt_open = false;
        tracing::info!("Admin session locked");
        Route::Home
    }
}
