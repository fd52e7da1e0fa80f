use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::retention::model::RetentionEntitlement;

/// Last known retention entitlement, as polled from the quota source.
///
/// Lives only in memory. A failed poll keeps the previous entitlement but
/// records the error; staleness is judged by `fetched_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitlementRuntimeState {
    pub entitlement: Option<RetentionEntitlement>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl EntitlementRuntimeState {
    pub fn record(&mut self, entitlement: RetentionEntitlement, now: DateTime<Utc>) {
        self.entitlement = Some(entitlement);
        self.fetched_at = Some(now);
        self.last_error_message = None;
    }

    pub fn mark_error(&mut self, message: String, now: DateTime<Utc>) {
        self.last_error_at = Some(now);
        self.last_error_message = Some(message);
    }

    /// The entitlement if it was fetched within `max_age` of `now`.
    pub fn fresh(&self, max_age: Duration, now: DateTime<Utc>) -> Option<&RetentionEntitlement> {
        let fetched_at = self.fetched_at?;
        if now - fetched_at > max_age {
            return None;
        }
        self.entitlement.as_ref()
    }
}
