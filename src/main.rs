use anyhow::{anyhow, Result};
use tracing::{info, warn};

use logscope::app_state::build_app_state;
use logscope::core::config::LogScopeConfig;
use logscope::core::util::logging::init_tracing;
use logscope::domain::retention::model::RangePreset;
use logscope::domain::retention::service::date_range_resolver::RangeSelection;
use logscope::scheduler::tasks::entitlement_refresh::task::refresh_entitlement;

/// `logscope [preset]` prints the first page of function execution logs
/// for the configured project as JSON. `preset` is one of 1h, 24h, 3d, 7d,
/// 30d or 90d (default 24h).
#[tokio::main]
async fn main() -> Result<()> {
    let config = LogScopeConfig::from_env()?;
    let _guard = init_tracing(config.log_dir.as_deref());

    let code = std::env::args()
        .nth(1)
        .unwrap_or_else(|| RangePreset::default().as_code().to_string());
    let preset = RangePreset::from_code(&code)
        .filter(|p| !p.is_custom())
        .ok_or_else(|| anyhow!("Unknown preset '{code}'; expected one of 1h, 24h, 3d, 7d, 30d, 90d"))?;

    let state = build_app_state(config)?;

    if let Err(e) = refresh_entitlement(state.entitlement_source.as_ref(), &state.entitlement).await {
        warn!(error = %e, "Continuing with the most restrictive retention");
    }

    let mut orchestrator = state.new_orchestrator().await?;
    orchestrator.set_selection(RangeSelection::preset(preset))?;
    info!(preset = preset.as_code(), "Searching logs");

    let query_state = orchestrator.search().await?;
    if let Some(reason) = query_state.error() {
        return Err(anyhow::Error::new(reason.clone()));
    }

    match orchestrator.paginated_response() {
        Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        None => println!("[]"),
    }
    Ok(())
}
