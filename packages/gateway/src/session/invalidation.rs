//! Central reaction to "the session is no longer valid".
//!
//! Every 401 from the backend lands here, no matter which screen issued the
//! call. The handler clears the credential store and forces one navigation
//! to the login entry point, so individual screens never check for expiry
//! themselves.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::CredentialStore;

/// Login entry point; the invalidation redirect target.
pub const LOGIN_PATH: &str = "/login";

/// Where a successful login lands.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Navigation capability.
///
/// Injected instead of writing to a hidden global, so the gateway stays free
/// of UI dependencies and tests can observe redirects.
pub trait Navigator: Send + Sync {
    /// Current location path.
    fn location(&self) -> String;

    /// Replace the current location.
    fn replace(&self, path: &str);
}

/// Clears the session and returns the user to login.
///
/// Safe to invoke from several in-flight requests at once: later calls
/// re-clear an already-empty store and skip the navigation.
pub struct SessionInvalidator {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    // Serializes the check-then-navigate step so overlapping 401s cannot
    // both observe a non-login location.
    redirect_gate: Mutex<()>,
}

impl SessionInvalidator {
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            redirect_gate: Mutex::new(()),
        }
    }

    /// Discard the session and navigate to login unless already there.
    pub async fn invalidate(&self) {
        if let Err(error) = self.store.clear().await {
            warn!(%error, "failed to clear credential store during invalidation");
        }

        let _gate = self.redirect_gate.lock().await;
        if self.navigator.location() != LOGIN_PATH {
            info!("session invalidated, redirecting to login");
            self.navigator.replace(LOGIN_PATH);
        }
    }
}
