//! Session state and the credential store capability.
//!
//! The store is the only shared mutable resource in the gateway: every
//! outbound call reads it, the login flow writes it, and the invalidation
//! handler clears it. Callers inject an implementation rather than reaching
//! for ambient storage, so tests (and non-browser targets like the CLI) can
//! supply their own.

mod invalidation;

pub use invalidation::{Navigator, SessionInvalidator, DASHBOARD_PATH, LOGIN_PATH};

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Staff roles recognized by the dashboard.
///
/// The OTP login path is staff-only; a verify response carrying any other
/// role is a server-side bug and fails loudly at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Admin,
    Floor,
    Cashier,
    Kitchen,
    ComplianceOfficer,
}

/// Authenticated identity held client-side after login.
///
/// A present token means the route guard admits access; it says nothing
/// about server-side validity, which is discovered lazily on the first
/// rejected call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: StaffRole,
}

/// Storage capability for the current [`Session`].
///
/// Purely storage: no network, no validation. `get` never fails observably;
/// unreadable state degrades to `None`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a session, overwriting any prior value.
    async fn set(&self, session: Session) -> Result<()>;

    /// Current session, if any.
    async fn get(&self) -> Option<Session>;

    /// Remove all persisted fields.
    async fn clear(&self) -> Result<()>;
}

/// In-process store.
///
/// The RwLock keeps reads and writes atomic with respect to each other on
/// the multi-threaded runtime.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: RwLock<Option<Session>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn set(&self, session: Session) -> Result<()> {
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn get(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

/// Durable store backed by a JSON file.
///
/// The file plays the role browser storage plays for the dashboard: the
/// session survives process restarts until logout or invalidation deletes
/// it. A missing or corrupt file reads as signed-out.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn set(&self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn get(&self) -> Option<Session> {
        let bytes = tokio::fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(error) => {
                debug!(path = %self.path.display(), %error, "stored session unreadable, treating as signed out");
                None
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
