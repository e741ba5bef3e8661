//! Client-side session/auth gateway for the PRMS admin dashboard.
//!
//! Screens never talk to the network directly. They build an [`ApiRequest`],
//! hand it to the [`ApiGateway`] (the single outbound chokepoint), and render
//! behind a [`RouteGuard`]. Sessions are established by the two-step
//! [`LoginFlow`] and held in an injected [`CredentialStore`]; any 401 from
//! the backend funnels into the [`SessionInvalidator`], which clears the
//! store and forces one navigation back to the login entry point.

pub mod auth;
pub mod gateway;
pub mod guard;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use auth::{LoginFlow, LoginStep, SubmitOutcome};
pub use gateway::{ApiGateway, ApiRequest, GatewayError, Method, PUBLIC_API_PREFIX};
pub use guard::{Admission, RouteGuard};
pub use session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, Navigator, Session,
    SessionInvalidator, StaffRole, DASHBOARD_PATH, LOGIN_PATH,
};
