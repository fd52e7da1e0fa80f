use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::log_search_request_dto::LogSearchRequestDto;
use crate::api::dto::log_search_response_dto::LogSearchResponseDto;
use crate::core::client::http_client::{join_url, with_api_key};
use crate::core::client::log_search_transport_trait::LogSearchTransport;
use crate::core::state::cache::QueryKey;
use crate::domain::log::model::LogPage;
use crate::errors::{transport_error, LogSearchError};

const SEARCH_PATH: &str = "/v1/logs/search";

/// Parameters owned by the request itself; extra filters may not override them.
const RESERVED_PARAMS: [&str; 6] = ["log_type", "start_time", "end_time", "limit", "cursor", "project_id"];

/// HTTP implementation of [`LogSearchTransport`].
pub struct LogSearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LogSearchClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl LogSearchTransport for LogSearchClient {
    async fn search(&self, key: &QueryKey) -> Result<LogPage, LogSearchError> {
        let params = LogSearchRequestDto::from(key);
        params
            .validate()
            .map_err(|e| LogSearchError::InvalidRequest(e.to_string()))?;

        let extra: Vec<(&str, &str)> = key
            .filters
            .iter()
            .filter(|(k, _)| {
                let reserved = RESERVED_PARAMS.contains(k);
                if reserved {
                    warn!(param = *k, "Ignoring filter that shadows a search parameter");
                }
                !reserved
            })
            .collect();

        let request_id = Uuid::new_v4();
        let url = join_url(&self.base_url, SEARCH_PATH);
        info!(%request_id, key = %key, "Issuing log search");

        let req = self
            .client
            .get(&url)
            .query(&params)
            .query(&extra)
            .header("X-Request-Id", request_id.to_string());

        let resp = with_api_key(req, self.api_key.as_deref())
            .send()
            .await
            .map_err(|e| {
                warn!(%request_id, error = %e, "Log search request failed");
                transport_error(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%request_id, %status, "Log search returned an error status");
            return Err(LogSearchError::Transport {
                status: Some(status),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                },
            });
        }

        let body: LogSearchResponseDto = resp
            .json()
            .await
            .map_err(|e| LogSearchError::Decode(format!("log search response: {e}")))?;

        Ok(body.into())
    }
}
