use serde::{Deserialize, Serialize};

/// Retention allowance granted by the billing collaborator.
///
/// Read-only to this crate; refreshed by the entitlement poller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetentionEntitlement {
    pub max_days: u32,
    pub plan_name: String,
}

impl RetentionEntitlement {
    pub fn new(plan_name: impl Into<String>, max_days: u32) -> Self {
        Self {
            max_days,
            plan_name: plan_name.into(),
        }
    }

    pub fn plan(&self) -> Option<Plan> {
        Plan::from_code(&self.plan_name)
    }
}

/// Subscription tiers this crate recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Starter,
    Team,
    Enterprise,
}

impl Plan {
    pub fn as_code(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Team => "team",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "starter" => Some(Plan::Starter),
            "team" => Some(Plan::Team),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}
