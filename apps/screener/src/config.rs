use anyhow::{Context, Result};

pub const DEFAULT_SCORING_SERVICE_URL: &str = "http://localhost:8000";

/// Client configuration loaded from the environment (and `.env` if present).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the remote scoring service.
    pub scoring_service_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let scoring_service_url = lookup("SCORING_SERVICE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_SCORING_SERVICE_URL.to_string());

        reqwest::Url::parse(&scoring_service_url).with_context(|| {
            format!("SCORING_SERVICE_URL '{scoring_service_url}' is not a valid URL")
        })?;

        Ok(Config {
            scoring_service_url,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
