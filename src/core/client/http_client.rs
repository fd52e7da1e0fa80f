use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::errors::LogSearchError;

/// Shared reqwest client with the configured per-request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client, LogSearchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("logscope/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LogSearchError::Config(format!("Failed to build HTTP client: {e}")))
}

pub fn with_api_key(req: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => req.bearer_auth(key),
        None => req,
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://x/", "/v1/logs"), "http://x/v1/logs");
        assert_eq!(join_url("http://x", "v1/logs"), "http://x/v1/logs");
    }
}
