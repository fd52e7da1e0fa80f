use async_trait::async_trait;

use crate::domain::retention::model::RetentionEntitlement;
use crate::errors::LogSearchError;

/// Billing/quota collaborator that knows the current plan's retention.
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    async fn fetch_entitlement(&self) -> Result<RetentionEntitlement, LogSearchError>;
}
