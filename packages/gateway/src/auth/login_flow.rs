//! Two-step OTP login state machine.
//!
//! `Phone --request--> Otp --verify--> session`. Malformed input never
//! reaches the network; server failures keep the flow in place with the
//! server's message surfaced for the form to render inline.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::OtpVerifyResponse;
use crate::gateway::{ApiGateway, ApiRequest, GatewayError};
use crate::session::{CredentialStore, Session};

const PHONE_DIGITS: usize = 10;
const CODE_DIGITS: usize = 6;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Flow state. Terminal transition is a successful verify, after which the
/// flow is torn down and a [`Session`] exists instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Phone,
    Otp,
}

/// What a submission did, for headless callers driving the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation or server failure; state unchanged, `error()` explains.
    Stayed,
    /// Code requested; now in the `Otp` step.
    CodeSent,
    /// Session persisted; caller navigates to the dashboard.
    Authenticated,
}

pub struct LoginFlow {
    gateway: Arc<ApiGateway>,
    store: Arc<dyn CredentialStore>,
    step: LoginStep,
    phone_number: String,
    submitted_code: String,
    error: Option<String>,
    pending: bool,
}

impl LoginFlow {
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            store,
            step: LoginStep::Phone,
            phone_number: String::new(),
            submitted_code: String::new(),
            error: None,
            pending: false,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    /// Inline error text for the current form, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// The code kept on a failed verify; it is not auto-cleared.
    pub fn submitted_code(&self) -> &str {
        &self.submitted_code
    }

    /// Submit a phone number, requesting a one-time code for it.
    pub async fn submit_phone(&mut self, raw: &str) -> SubmitOutcome {
        if self.step != LoginStep::Phone || self.pending {
            return SubmitOutcome::Stayed;
        }
        let digits = digits_of(raw);
        if digits.len() != PHONE_DIGITS {
            self.error = Some("Enter a valid 10-digit phone number".to_string());
            return SubmitOutcome::Stayed;
        }

        self.pending = true;
        self.error = None;
        let result = self
            .gateway
            .call(ApiRequest::post(
                "/auth/otp/request",
                json!({ "phone": digits }),
            ))
            .await;
        self.pending = false;

        match result {
            Ok(_) => {
                info!("otp requested, moving to code entry");
                self.phone_number = digits;
                self.step = LoginStep::Otp;
                SubmitOutcome::CodeSent
            }
            Err(error) => {
                self.error = Some(surface(error));
                SubmitOutcome::Stayed
            }
        }
    }

    /// Submit the one-time code for the phone number on file.
    pub async fn submit_code(&mut self, raw: &str) -> SubmitOutcome {
        if self.step != LoginStep::Otp || self.pending {
            return SubmitOutcome::Stayed;
        }
        let digits = digits_of(raw);
        if digits.len() != CODE_DIGITS {
            self.error = Some("Enter the 6-digit code".to_string());
            return SubmitOutcome::Stayed;
        }
        self.submitted_code = digits.clone();

        self.pending = true;
        self.error = None;
        // isStaff is mandatory: this login path is restricted to staff
        // accounts, unlike the player-facing flow.
        let result: Result<OtpVerifyResponse, GatewayError> = self
            .gateway
            .call_json(ApiRequest::post(
                "/auth/otp/verify",
                json!({
                    "phone": self.phone_number,
                    "otp": digits,
                    "isStaff": true,
                }),
            ))
            .await;
        self.pending = false;

        let verified = match result {
            Ok(verified) => verified,
            Err(error) => {
                self.error = Some(surface(error));
                return SubmitOutcome::Stayed;
            }
        };

        let session = Session {
            token: verified.access_token,
            user_id: verified.user.id,
            role: verified.user.role,
        };
        if let Err(error) = self.store.set(session).await {
            self.error = Some(format!("Failed to save session: {error}"));
            return SubmitOutcome::Stayed;
        }

        info!("staff login verified, session established");
        SubmitOutcome::Authenticated
    }

    /// Back to the phone step; clears only the code and the error.
    pub fn change_number(&mut self) {
        if self.step == LoginStep::Otp {
            self.step = LoginStep::Phone;
            self.submitted_code.clear();
            self.error = None;
        }
    }
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// User-facing text for a gateway failure: the server's message verbatim
/// when it sent one, a generic line otherwise.
fn surface(error: GatewayError) -> String {
    error
        .server_message()
        .map(str::to_owned)
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryCredentialStore, SessionInvalidator, StaffRole};
    use crate::testutil::{spawn_stub, RecordingNavigator};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct StubState {
        requests: Arc<AtomicUsize>,
        verifies: Arc<AtomicUsize>,
        reject_request: Arc<AtomicUsize>, // remaining rejections, 429 with message
        reject_verify: Arc<AtomicUsize>,  // remaining rejections, 400 with message
    }

    async fn otp_request(State(state): State<StubState>) -> (StatusCode, Json<serde_json::Value>) {
        state.requests.fetch_add(1, Ordering::SeqCst);
        if state.reject_request.load(Ordering::SeqCst) > 0 {
            state.reject_request.fetch_sub(1, Ordering::SeqCst);
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({"message": "Too many requests. Try again later."})),
            );
        }
        (StatusCode::OK, Json(serde_json::json!({})))
    }

    async fn otp_verify(
        State(state): State<StubState>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        state.verifies.fetch_add(1, Ordering::SeqCst);
        // The staff marker is part of the wire contract.
        assert_eq!(body["isStaff"], serde_json::Value::Bool(true));
        if state.reject_verify.load(Ordering::SeqCst) > 0 {
            state.reject_verify.fetch_sub(1, Ordering::SeqCst);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"message": "Invalid OTP"})),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "accessToken": "T",
                "user": { "id": "U1", "role": "ADMIN" },
            })),
        )
    }

    struct Harness {
        flow: LoginFlow,
        store: Arc<MemoryCredentialStore>,
        state: StubState,
    }

    async fn harness() -> Harness {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/auth/otp/request", post(otp_request))
            .route("/api/auth/otp/verify", post(otp_verify))
            .with_state(state.clone());
        let origin = spawn_stub(app).await;

        let store = Arc::new(MemoryCredentialStore::new());
        let navigator = Arc::new(RecordingNavigator::at(crate::session::LOGIN_PATH));
        let invalidator = Arc::new(SessionInvalidator::new(store.clone(), navigator));
        let gateway = Arc::new(ApiGateway::new(&origin, store.clone(), invalidator).unwrap());
        let flow = LoginFlow::new(gateway, store.clone());
        Harness { flow, store, state }
    }

    #[tokio::test]
    async fn short_phone_is_rejected_without_network_call() {
        let mut h = harness().await;

        for raw in ["", "555123", "555-123-456", "abc"] {
            assert_eq!(h.flow.submit_phone(raw).await, SubmitOutcome::Stayed);
            assert_eq!(h.flow.step(), LoginStep::Phone);
            assert!(h.flow.error().is_some());
        }
        assert_eq!(h.state.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn formatted_phone_is_normalized_and_accepted() {
        let mut h = harness().await;

        let outcome = h.flow.submit_phone("(555) 123-4567").await;
        assert_eq!(outcome, SubmitOutcome::CodeSent);
        assert_eq!(h.flow.step(), LoginStep::Otp);
        assert_eq!(h.flow.phone_number(), "5551234567");
        assert!(h.flow.error().is_none());
        assert_eq!(h.state.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_code_request_stays_on_phone_with_server_message() {
        let mut h = harness().await;
        h.state.reject_request.store(1, Ordering::SeqCst);

        let outcome = h.flow.submit_phone("5551234567").await;
        assert_eq!(outcome, SubmitOutcome::Stayed);
        assert_eq!(h.flow.step(), LoginStep::Phone);
        assert_eq!(h.flow.error(), Some("Too many requests. Try again later."));

        // Resubmission works once the server relents.
        assert_eq!(h.flow.submit_phone("5551234567").await, SubmitOutcome::CodeSent);
    }

    #[tokio::test]
    async fn short_code_is_rejected_without_network_call() {
        let mut h = harness().await;
        h.flow.submit_phone("5551234567").await;

        for raw in ["", "12345", "1234567"] {
            assert_eq!(h.flow.submit_code(raw).await, SubmitOutcome::Stayed);
            assert_eq!(h.flow.step(), LoginStep::Otp);
            assert!(h.flow.error().is_some());
        }
        assert_eq!(h.state.verifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_verify_populates_the_store() {
        let mut h = harness().await;
        h.flow.submit_phone("5551234567").await;

        let outcome = h.flow.submit_code("123 456").await;
        assert_eq!(outcome, SubmitOutcome::Authenticated);

        let session = h.store.get().await.expect("session persisted");
        assert_eq!(session.token, "T");
        assert_eq!(session.user_id, "U1");
        assert_eq!(session.role, StaffRole::Admin);
    }

    #[tokio::test]
    async fn failed_verify_keeps_the_code_and_surfaces_the_message() {
        let mut h = harness().await;
        h.flow.submit_phone("5551234567").await;
        h.state.reject_verify.store(1, Ordering::SeqCst);

        let outcome = h.flow.submit_code("123456").await;
        assert_eq!(outcome, SubmitOutcome::Stayed);
        assert_eq!(h.flow.step(), LoginStep::Otp);
        assert_eq!(h.flow.error(), Some("Invalid OTP"));
        assert_eq!(h.flow.submitted_code(), "123456");
        assert!(h.store.get().await.is_none());
    }

    #[tokio::test]
    async fn change_number_resets_code_and_error_only() {
        let mut h = harness().await;
        h.flow.submit_phone("5551234567").await;
        h.state.reject_verify.store(1, Ordering::SeqCst);
        h.flow.submit_code("123456").await;

        h.flow.change_number();
        assert_eq!(h.flow.step(), LoginStep::Phone);
        assert_eq!(h.flow.submitted_code(), "");
        assert!(h.flow.error().is_none());
        // The phone number itself is kept for resubmission.
        assert_eq!(h.flow.phone_number(), "5551234567");
    }

    #[tokio::test]
    async fn change_number_in_phone_step_is_a_no_op() {
        let mut h = harness().await;
        h.flow.change_number();
        assert_eq!(h.flow.step(), LoginStep::Phone);
    }

    #[tokio::test]
    async fn out_of_step_submissions_are_no_ops() {
        let mut h = harness().await;

        // No code submission before a code was requested.
        assert_eq!(h.flow.submit_code("123456").await, SubmitOutcome::Stayed);
        assert_eq!(h.state.verifies.load(Ordering::SeqCst), 0);

        h.flow.submit_phone("5551234567").await;

        // No fresh code request while waiting on a code.
        assert_eq!(h.flow.submit_phone("5551234567").await, SubmitOutcome::Stayed);
        assert_eq!(h.state.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn network_failure_surfaces_generic_message() {
        // Point the flow at a dead origin; nothing is listening there.
        let store = Arc::new(MemoryCredentialStore::new());
        let navigator = Arc::new(RecordingNavigator::at(crate::session::LOGIN_PATH));
        let invalidator = Arc::new(SessionInvalidator::new(store.clone(), navigator));
        let gateway = Arc::new(
            ApiGateway::new("http://127.0.0.1:9", store.clone(), invalidator).unwrap(),
        );
        let mut flow = LoginFlow::new(gateway, store);

        let outcome = flow.submit_phone("5551234567").await;
        assert_eq!(outcome, SubmitOutcome::Stayed);
        assert_eq!(flow.error(), Some(GENERIC_FAILURE));
        assert_eq!(flow.step(), LoginStep::Phone);
    }
}
