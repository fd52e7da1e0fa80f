use chrono::Duration;
use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Symbolic time-range shortcuts offered by the log viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    LastHour,
    #[default]
    Last24Hours,
    Last3Days,
    Last7Days,
    Last30Days,
    Last90Days,
    Custom,
}

impl RangePreset {
    /// Menu order, shortest first. `Custom` is always last.
    pub const ALL: [RangePreset; 7] = [
        RangePreset::LastHour,
        RangePreset::Last24Hours,
        RangePreset::Last3Days,
        RangePreset::Last7Days,
        RangePreset::Last30Days,
        RangePreset::Last90Days,
        RangePreset::Custom,
    ];

    /// Nominal duration in minutes. `None` for the calendar picker.
    pub const fn nominal_minutes(self) -> Option<i64> {
        match self {
            RangePreset::LastHour => Some(MINUTES_PER_HOUR),
            RangePreset::Last24Hours => Some(MINUTES_PER_DAY),
            RangePreset::Last3Days => Some(3 * MINUTES_PER_DAY),
            RangePreset::Last7Days => Some(7 * MINUTES_PER_DAY),
            RangePreset::Last30Days => Some(30 * MINUTES_PER_DAY),
            RangePreset::Last90Days => Some(90 * MINUTES_PER_DAY),
            RangePreset::Custom => None,
        }
    }

    pub fn nominal_duration(self) -> Option<Duration> {
        self.nominal_minutes().map(Duration::minutes)
    }

    pub fn is_custom(self) -> bool {
        matches!(self, RangePreset::Custom)
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            RangePreset::LastHour => "1h",
            RangePreset::Last24Hours => "24h",
            RangePreset::Last3Days => "3d",
            RangePreset::Last7Days => "7d",
            RangePreset::Last30Days => "30d",
            RangePreset::Last90Days => "90d",
            RangePreset::Custom => "custom",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "1h" | "hour" => Some(RangePreset::LastHour),
            "24h" | "1d" | "day" => Some(RangePreset::Last24Hours),
            "3d" => Some(RangePreset::Last3Days),
            "7d" | "week" => Some(RangePreset::Last7Days),
            "30d" | "month" => Some(RangePreset::Last30Days),
            "90d" => Some(RangePreset::Last90Days),
            "custom" => Some(RangePreset::Custom),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangePreset::LastHour => "Past 1 hour",
            RangePreset::Last24Hours => "Past 24 hours",
            RangePreset::Last3Days => "Past 3 days",
            RangePreset::Last7Days => "Past 7 days",
            RangePreset::Last30Days => "Past 30 days",
            RangePreset::Last90Days => "Past 90 days",
            RangePreset::Custom => "Custom range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_every_preset() {
        for preset in RangePreset::ALL {
            assert_eq!(RangePreset::from_code(preset.as_code()), Some(preset));
        }
        assert_eq!(RangePreset::from_code("fortnight"), None);
    }

    #[test]
    fn menu_order_is_ascending_by_duration() {
        let minutes: Vec<i64> = RangePreset::ALL
            .iter()
            .filter_map(|p| p.nominal_minutes())
            .collect();
        let mut sorted = minutes.clone();
        sorted.sort();
        assert_eq!(minutes, sorted);
        assert_eq!(RangePreset::Custom.nominal_minutes(), None);
    }
}
