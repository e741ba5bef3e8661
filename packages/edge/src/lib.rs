//! Network-edge reverse proxy for the PRMS admin dashboard.
//!
//! The browser-side gateway only ever talks to the public `/api` prefix;
//! this service owns the translation to the backend's real location and
//! version. One build artifact serves any deployment: the backend base is
//! read from the environment per request, never baked in.

pub mod app;
pub mod config;
pub mod proxy;
pub mod rewrite;

pub use app::{build_app, AppState};
pub use config::EdgeConfig;
pub use rewrite::{backend_base, rewrite_target, PUBLIC_API_PREFIX};
