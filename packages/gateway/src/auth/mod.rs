//! Staff login over phone + one-time code.

mod login_flow;

pub use login_flow::{LoginFlow, LoginStep, SubmitOutcome};

use serde::Deserialize;

use crate::session::StaffRole;

/// Identity claims in a successful verify response.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedUser {
    pub id: String,
    pub role: StaffRole,
}

/// Success body of `POST /auth/otp/verify`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyResponse {
    pub access_token: String,
    pub user: VerifiedUser,
}
