use serde::Deserialize;

use crate::domain::retention::model::RetentionEntitlement;

/// Body of `GET /v1/billing/quota-usage`; only the plan part is read.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaUsageDto {
    pub plan: QuotaPlanDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaPlanDto {
    pub name: String,
    #[serde(default)]
    pub features: PlanFeaturesDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFeaturesDto {
    pub log_retention_days: Option<u32>,
}

impl From<QuotaUsageDto> for RetentionEntitlement {
    /// A missing feature value maps to zero days, which the retention policy
    /// treats as the most restrictive tier.
    fn from(dto: QuotaUsageDto) -> Self {
        RetentionEntitlement::new(
            dto.plan.name,
            dto.plan.features.log_retention_days.unwrap_or(0),
        )
    }
}
