use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::api::dto::quota_usage_dto::QuotaUsageDto;
use crate::core::client::entitlement_source_trait::EntitlementSource;
use crate::core::client::http_client::{join_url, with_api_key};
use crate::domain::retention::model::RetentionEntitlement;
use crate::errors::{transport_error, LogSearchError};

const QUOTA_PATH: &str = "/v1/billing/quota-usage";

/// Reads the current plan and its `log_retention_days` feature value.
pub struct QuotaClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QuotaClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl EntitlementSource for QuotaClient {
    async fn fetch_entitlement(&self) -> Result<RetentionEntitlement, LogSearchError> {
        let url = join_url(&self.base_url, QUOTA_PATH);
        let req = self.client.get(&url);

        let resp = with_api_key(req, self.api_key.as_deref())
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, "Quota usage request failed");
            return Err(LogSearchError::Transport {
                status: Some(status),
                message: text,
            });
        }

        let dto: QuotaUsageDto = resp
            .json()
            .await
            .map_err(|e| LogSearchError::Decode(format!("quota usage response: {e}")))?;

        let entitlement = RetentionEntitlement::from(dto);
        debug!(plan = %entitlement.plan_name, days = entitlement.max_days, "Fetched retention entitlement");
        Ok(entitlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn reads_plan_retention() {
        let router = Router::new().route(
            QUOTA_PATH,
            get(|| async {
                Json(json!({
                    "projects_used": 1,
                    "plan": {
                        "name": "free",
                        "features": { "log_retention_days": 3, "projects": 1 }
                    }
                }))
            }),
        );
        let client = QuotaClient::new(Client::new(), spawn_backend(router).await, None);

        let ent = client.fetch_entitlement().await.unwrap();
        assert_eq!(ent, RetentionEntitlement::new("free", 3));
    }

    #[tokio::test]
    async fn missing_feature_maps_to_zero_days() {
        let router = Router::new().route(
            QUOTA_PATH,
            get(|| async { Json(json!({ "plan": { "name": "starter" } })) }),
        );
        let client = QuotaClient::new(Client::new(), spawn_backend(router).await, None);

        let ent = client.fetch_entitlement().await.unwrap();
        assert_eq!(ent.max_days, 0);
    }

    #[tokio::test]
    async fn error_status_surfaces_as_transport_error() {
        let router = Router::new().route(
            QUOTA_PATH,
            get(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let client = QuotaClient::new(Client::new(), spawn_backend(router).await, None);

        let err = client.fetch_entitlement().await.unwrap_err();
        assert!(matches!(
            err,
            LogSearchError::Transport { status: Some(s), .. } if s == StatusCode::UNAUTHORIZED
        ));
    }
}
