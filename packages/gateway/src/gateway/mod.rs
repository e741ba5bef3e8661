//! The single outbound chokepoint for backend calls.
//!
//! Every collaborator issues calls through [`ApiGateway`]: it attaches the
//! bearer credential, targets the public `/api` prefix (the edge proxy owns
//! the backend's real location), and funnels any 401 into the session
//! invalidation handler before the caller sees the error.

mod errors;

pub use errors::GatewayError;
pub use reqwest::Method;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;
use url::Url;

use crate::session::{CredentialStore, SessionInvalidator};

/// The only backend-bound path space the client knows about.
pub const PUBLIC_API_PREFIX: &str = "/api";

/// Transport timeout for every outbound call.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// One outbound call. Ephemeral; consumed by [`ApiGateway::call`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ApiRequest {
    pub method: Method,

    /// Path under the public prefix, e.g. `/admin/houses/list`.
    #[builder(setter(into))]
    pub path: String,

    #[builder(default, setter(strip_option))]
    pub body: Option<serde_json::Value>,

    /// When true and a token is stored, the bearer credential is attached.
    /// A missing token never pre-empts the call; the server is authoritative.
    #[builder(default = true)]
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest::builder().method(Method::GET).path(path).build()
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest::builder()
            .method(Method::POST)
            .path(path)
            .body(body)
            .build()
    }
}

/// The sanctioned way to reach the backend.
pub struct ApiGateway {
    http: reqwest::Client,
    origin: String,
    store: Arc<dyn CredentialStore>,
    invalidator: Arc<SessionInvalidator>,
}

impl ApiGateway {
    /// `origin` is the public-facing origin (the edge, not the backend),
    /// e.g. `http://localhost:3000`.
    pub fn new(
        origin: &str,
        store: Arc<dyn CredentialStore>,
        invalidator: Arc<SessionInvalidator>,
    ) -> Result<Self> {
        Url::parse(origin).with_context(|| format!("invalid gateway origin: {origin}"))?;
        let http = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            origin: origin.trim_end_matches('/').to_string(),
            store,
            invalidator,
        })
    }

    /// Issue a call. On 401 the session is invalidated before the error is
    /// propagated; every other failure is returned typed, without retry.
    pub async fn call(&self, request: ApiRequest) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}{}", self.origin, PUBLIC_API_PREFIX, request.path);
        debug!(method = %request.method, path = %request.path, "dispatching api call");

        let mut builder = self.http.request(request.method.clone(), &url);
        if request.requires_auth {
            if let Some(session) = self.store.get().await {
                builder = builder.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", session.token),
                );
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "call rejected with 401, invalidating session");
            let message = read_error_message(response).await;
            self.invalidator.invalidate().await;
            return Err(GatewayError::Unauthorized { message });
        }

        if !status.is_success() {
            let message = read_error_message(response).await.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// [`call`](Self::call) plus JSON decoding of the success body.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, GatewayError> {
        let response = self.call(request).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Best-effort extraction of `{"message": ...}` from a failure body.
async fn read_error_message(response: reqwest::Response) -> Option<String> {
    let value: serde_json::Value = response.json().await.ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}
