use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::retention::model::{RangePreset, RetentionEntitlement, TimeInterval};
use crate::domain::retention::service::retention_policy::{
    describe_restriction, earliest_allowed, is_preset_allowed, max_retention_days,
};
use crate::errors::LogSearchError;

/// What the user picked in the time-range control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeSelection {
    Preset { preset: RangePreset },
    Custom { from: DateTime<Utc>, to: DateTime<Utc> },
}

impl RangeSelection {
    pub fn preset(preset: RangePreset) -> Self {
        RangeSelection::Preset { preset }
    }

    pub fn custom(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        RangeSelection::Custom { from, to }
    }

    pub fn kind(&self) -> RangePreset {
        match self {
            RangeSelection::Preset { preset } => *preset,
            RangeSelection::Custom { .. } => RangePreset::Custom,
        }
    }
}

impl Default for RangeSelection {
    fn default() -> Self {
        RangeSelection::preset(RangePreset::default())
    }
}

/// Raised whenever a custom range lost history to the retention window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClampNotice {
    pub requested_from: DateTime<Utc>,
    pub clamped_from: DateTime<Utc>,
    pub max_days: u32,
}

impl ClampNotice {
    pub fn message(&self) -> String {
        format!(
            "Your plan retains logs for {} day{}; showing logs from {} instead of {}.",
            self.max_days,
            if self.max_days == 1 { "" } else { "s" },
            self.clamped_from.format("%Y-%m-%d %H:%M UTC"),
            self.requested_from.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub interval: TimeInterval,
    pub clamp: Option<ClampNotice>,
}

pub fn resolve(
    selection: &RangeSelection,
    entitlement: Option<&RetentionEntitlement>,
) -> Result<Resolution, LogSearchError> {
    resolve_at(selection, entitlement, Utc::now())
}

/// Turn a selection into a concrete interval relative to `now`.
///
/// Presets over the retention window are a [`LogSearchError::PolicyViolation`];
/// custom ranges reaching past it get `from` clamped to the earliest
/// retained instant and keep their `to`.
pub fn resolve_at(
    selection: &RangeSelection,
    entitlement: Option<&RetentionEntitlement>,
    now: DateTime<Utc>,
) -> Result<Resolution, LogSearchError> {
    match *selection {
        RangeSelection::Preset { preset } => {
            let Some(duration) = preset.nominal_duration() else {
                return Err(LogSearchError::InvalidRange(
                    "the custom preset needs a calendar range".into(),
                ));
            };

            if !is_preset_allowed(preset, entitlement) {
                let reason = describe_restriction(preset, entitlement)
                    .unwrap_or_else(|| "outside retention window".into());
                if cfg!(debug_assertions) {
                    panic!("disallowed preset {preset:?} reached the resolver: {reason}");
                }
                return Err(LogSearchError::PolicyViolation {
                    preset: preset.as_code().to_string(),
                    reason,
                });
            }

            Ok(Resolution {
                interval: TimeInterval::new(now - duration, now)?,
                clamp: None,
            })
        }
        RangeSelection::Custom { from, to } => {
            if from >= to {
                return Err(LogSearchError::InvalidRange(format!(
                    "custom range start {} is not before end {}",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }

            let earliest = earliest_allowed(entitlement, now);
            if to <= earliest {
                return Err(LogSearchError::RangeOutsideRetention { to, earliest });
            }

            if from >= earliest {
                return Ok(Resolution {
                    interval: TimeInterval::new(from, to)?,
                    clamp: None,
                });
            }

            debug!(
                requested = %from.to_rfc3339(),
                clamped = %earliest.to_rfc3339(),
                "Clamping custom range start to retention window"
            );

            Ok(Resolution {
                interval: TimeInterval::new(earliest, to)?,
                clamp: Some(ClampNotice {
                    requested_from: from,
                    clamped_from: earliest,
                    max_days: max_retention_days(entitlement),
                }),
            })
        }
    }
}

/// Whether an already-resolved interval still fits under `entitlement`.
pub fn interval_within_policy(
    interval: &TimeInterval,
    entitlement: Option<&RetentionEntitlement>,
    now: DateTime<Utc>,
) -> bool {
    // One minute of slack so a preset resolved a moment ago stays valid.
    interval.start() >= earliest_allowed(entitlement, now) - chrono::Duration::minutes(1)
}
