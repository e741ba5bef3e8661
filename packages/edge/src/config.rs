use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Edge service configuration loaded from environment variables.
///
/// Note the backend origin is intentionally absent here: it is resolved per
/// request (see [`crate::rewrite::backend_base`]) so that a running artifact
/// follows its environment.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub port: u16,
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }
}
