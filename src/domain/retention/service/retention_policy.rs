use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::retention::model::{RangePreset, RetentionEntitlement};

/// Retention granted when the entitlement is missing, stale, unknown or invalid.
pub const FALLBACK_RETENTION_DAYS: u32 = 1;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Maximum queryable log age, in days.
///
/// Fails closed: a missing entitlement, a zero allowance, or a plan name we do
/// not recognise all yield [`FALLBACK_RETENTION_DAYS`] (an unknown plan keeps
/// its allowance only if it is smaller than the fallback).
pub fn max_retention_days(entitlement: Option<&RetentionEntitlement>) -> u32 {
    let Some(ent) = entitlement else {
        return FALLBACK_RETENTION_DAYS;
    };

    if ent.max_days == 0 {
        return FALLBACK_RETENTION_DAYS;
    }

    match ent.plan() {
        Some(_) => ent.max_days,
        None => ent.max_days.min(FALLBACK_RETENTION_DAYS),
    }
}

pub fn max_retention_minutes(entitlement: Option<&RetentionEntitlement>) -> i64 {
    i64::from(max_retention_days(entitlement)) * MINUTES_PER_DAY
}

/// Oldest instant the plan may query, relative to `now`.
pub fn earliest_allowed(entitlement: Option<&RetentionEntitlement>, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(i64::from(max_retention_days(entitlement)))
}

pub fn is_preset_allowed(preset: RangePreset, entitlement: Option<&RetentionEntitlement>) -> bool {
    match preset.nominal_minutes() {
        Some(minutes) => minutes <= max_retention_minutes(entitlement),
        // The calendar picker is always offered; its selections get clamped.
        None => true,
    }
}

pub fn allowed_presets(entitlement: Option<&RetentionEntitlement>) -> BTreeSet<RangePreset> {
    RangePreset::ALL
        .into_iter()
        .filter(|p| is_preset_allowed(*p, entitlement))
        .collect()
}

/// Why a preset is disabled, or `None` when it may be selected.
pub fn describe_restriction(
    preset: RangePreset,
    entitlement: Option<&RetentionEntitlement>,
) -> Option<String> {
    if is_preset_allowed(preset, entitlement) {
        return None;
    }

    let days = max_retention_days(entitlement);
    let plan = entitlement
        .map(|e| e.plan_name.as_str())
        .unwrap_or("current");

    Some(format!(
        "{} is unavailable: the {} plan retains logs for {} day{}. Upgrade your plan to view older logs.",
        preset.label(),
        plan,
        days,
        if days == 1 { "" } else { "s" }
    ))
}

/// One entry of the time-range menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetOption {
    pub preset: RangePreset,
    pub label: &'static str,
    pub enabled: bool,
    pub restriction: Option<String>,
}

/// The full menu in display order, disabled entries included for discoverability.
pub fn preset_options(entitlement: Option<&RetentionEntitlement>) -> Vec<PresetOption> {
    RangePreset::ALL
        .into_iter()
        .map(|preset| {
            let restriction = describe_restriction(preset, entitlement);
            PresetOption {
                preset,
                label: preset.label(),
                enabled: restriction.is_none(),
                restriction,
            }
        })
        .collect()
}

/// Widest allowed preset not wider than `preset`.
///
/// Used when a re-polled entitlement shrinks under an active selection.
pub fn widest_allowed_at_most(
    preset: RangePreset,
    entitlement: Option<&RetentionEntitlement>,
) -> RangePreset {
    let ceiling = preset.nominal_minutes().unwrap_or(i64::MAX);

    RangePreset::ALL
        .into_iter()
        .filter(|p| !p.is_custom())
        .filter(|p| p.nominal_minutes().is_some_and(|m| m <= ceiling))
        .filter(|p| is_preset_allowed(*p, entitlement))
        .last()
        .unwrap_or(RangePreset::LastHour)
}
