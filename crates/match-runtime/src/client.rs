//! Match-details HTTP client and response classification.

use std::time::Duration;

use match_core::error::{MatchError, Result};
use match_core::models::MatchRecord;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

/// What a single match-details request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A valid match; the full response body, kept verbatim.
    Match(Value),
    /// The remote service rejected the ID (`result.error`, or a non-success status).
    Invalid(String),
    /// The body could not be read as a match (not JSON, missing keys).
    Malformed(String),
    /// HTTP 429; `retry_after` is the server's hint, when given in seconds.
    RateLimited { retry_after: Option<Duration> },
    /// HTTP 401/403: the API key is wrong or revoked, so no ID can succeed.
    Unauthorized(u16),
}

/// Anything that can look up one match by ID.
///
/// An `Err` means the service could not be reached at all; every answer the
/// service does give is a [`FetchOutcome`].
pub trait MatchSource {
    fn fetch_match(&mut self, match_id: u64) -> Result<FetchOutcome>;
}

/// Connection settings for [`SteamMatchClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// Blocking client for the Steam `GetMatchDetails` endpoint.
pub struct SteamMatchClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl SteamMatchClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("dota-matches/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MatchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl MatchSource for SteamMatchClient {
    fn fetch_match(&mut self, match_id: u64) -> Result<FetchOutcome> {
        let id = match_id.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("match_id", id.as_str()), ("key", self.api_key.as_str())])
            .send()
            // The URL carries the API key; keep it out of error messages.
            .map_err(|e| MatchError::Request(e.without_url().to_string()))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .map_err(|e| MatchError::Request(e.without_url().to_string()))?;

        debug!(match_id, status = status.as_u16(), bytes = body.len(), "match details response");
        Ok(classify_response(status, retry_after.as_deref(), &body))
    }
}

/// Decide what a match-details response means.
pub fn classify_response(status: StatusCode, retry_after: Option<&str>, body: &str) -> FetchOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchOutcome::RateLimited {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return FetchOutcome::Unauthorized(status.as_u16());
    }
    if !status.is_success() {
        return FetchOutcome::Invalid(format!("HTTP {}", status.as_u16()));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return FetchOutcome::Malformed(format!("body is not JSON: {}", e)),
    };

    let Some(result) = value.get("result") else {
        return FetchOutcome::Malformed("missing 'result'".to_string());
    };
    if let Some(error) = result.get("error") {
        let reason = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return FetchOutcome::Invalid(reason);
    }

    match serde_json::from_value::<MatchRecord>(value.clone()) {
        Ok(_) => FetchOutcome::Match(value),
        Err(e) => FetchOutcome::Malformed(e.to_string()),
    }
}
