//! Mount-time admission check for protected screens.

use std::sync::Arc;

use tracing::debug;

use crate::session::{CredentialStore, Navigator, Session, LOGIN_PATH};

/// Outcome of the admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Session present; render children.
    Granted(Session),
    /// No session; the navigator has been pointed at login. Render nothing.
    Redirected,
}

/// Gates rendering on the presence of a session.
///
/// Presence only: token validity is the backend's call, and an expired token
/// surfaces through the gateway's 401 path on the first rejected request.
/// This is a UX convenience, not a security boundary.
pub struct RouteGuard {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub async fn admit(&self) -> Admission {
        match self.store.get().await {
            Some(session) => Admission::Granted(session),
            None => {
                debug!("no session present, redirecting to login");
                if self.navigator.location() != LOGIN_PATH {
                    self.navigator.replace(LOGIN_PATH);
                }
                Admission::Redirected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryCredentialStore, StaffRole};
    use crate::testutil::RecordingNavigator;

    #[tokio::test]
    async fn empty_store_redirects_to_login() {
        let store = Arc::new(MemoryCredentialStore::new());
        let navigator = Arc::new(RecordingNavigator::at("/houses"));
        let guard = RouteGuard::new(store, navigator.clone());

        assert_eq!(guard.admit().await, Admission::Redirected);
        assert_eq!(navigator.location(), LOGIN_PATH);
        assert_eq!(navigator.replacements().len(), 1);
    }

    #[tokio::test]
    async fn present_session_is_granted_without_navigation() {
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .set(Session {
                token: "T".into(),
                user_id: "U1".into(),
                role: StaffRole::Kitchen,
            })
            .await
            .unwrap();
        let navigator = Arc::new(RecordingNavigator::at("/houses"));
        let guard = RouteGuard::new(store, navigator.clone());

        match guard.admit().await {
            Admission::Granted(session) => assert_eq!(session.token, "T"),
            Admission::Redirected => panic!("expected admission"),
        }
        assert!(navigator.replacements().is_empty());
    }

    #[tokio::test]
    async fn guard_does_not_judge_token_validity() {
        // A stale token still admits; the first failing call handles it.
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .set(Session {
                token: "long-expired".into(),
                user_id: "U1".into(),
                role: StaffRole::ComplianceOfficer,
            })
            .await
            .unwrap();
        let navigator = Arc::new(RecordingNavigator::at("/staff/attendance"));
        let guard = RouteGuard::new(store, navigator.clone());

        assert!(matches!(guard.admit().await, Admission::Granted(_)));
    }
}
