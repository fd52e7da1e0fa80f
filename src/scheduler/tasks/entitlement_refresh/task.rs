use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::client::entitlement_source_trait::EntitlementSource;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_manager::EntitlementRuntimeStateManager;
use crate::core::state::runtime::entitlement::entitlement_runtime_state_repository_trait::EntitlementRuntimeStateRepositoryTrait;

/// Poll the quota source once and store the result.
///
/// A failure is recorded on the runtime state and returned; the previous
/// entitlement stays until it ages out.
pub async fn refresh_entitlement<S, R>(
    source: &S,
    manager: &EntitlementRuntimeStateManager<R>,
) -> Result<()>
where
    S: EntitlementSource + ?Sized,
    R: EntitlementRuntimeStateRepositoryTrait,
{
    debug!("Refreshing retention entitlement...");

    match source.fetch_entitlement().await {
        Ok(entitlement) => {
            debug!(plan = %entitlement.plan_name, days = entitlement.max_days, "Entitlement refreshed");
            manager.record(entitlement).await;
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Entitlement refresh failed");
            manager.mark_error(e.to_string()).await;
            Err(e).context("failed to refresh retention entitlement")
        }
    }
}
