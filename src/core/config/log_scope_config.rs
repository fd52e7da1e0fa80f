use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use validator::Validate;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, Validate)]
pub struct LogScopeConfig {
    #[validate(url)]
    pub api_base_url: String,
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub project_id: String,
    #[validate(range(min = 1, max = 1000))]
    pub page_size: u32,
    #[validate(range(min = 1, max = 86400))]
    pub entitlement_poll_secs: u64,
    #[validate(range(min = 1))]
    pub entitlement_max_age_secs: u64,
    /// 0 disables expiry.
    pub cache_ttl_secs: u64,
    pub log_dir: Option<PathBuf>,
    #[validate(range(min = 1, max = 600))]
    pub http_timeout_secs: u64,
}

impl LogScopeConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cfg = Self {
            api_base_url: non_empty("LOGSCOPE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_key: non_empty("LOGSCOPE_API_KEY"),
            project_id: non_empty("LOGSCOPE_PROJECT_ID")
                .ok_or_else(|| anyhow!("LOGSCOPE_PROJECT_ID is required"))?,
            page_size: parse_or(&non_empty, "LOGSCOPE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            entitlement_poll_secs: parse_or(&non_empty, "LOGSCOPE_ENTITLEMENT_POLL_SECS", 60)?,
            entitlement_max_age_secs: parse_or(&non_empty, "LOGSCOPE_ENTITLEMENT_MAX_AGE_SECS", 300)?,
            cache_ttl_secs: parse_or(&non_empty, "LOGSCOPE_CACHE_TTL_SECS", 30)?,
            log_dir: non_empty("LOGSCOPE_LOG_DIR").map(PathBuf::from),
            http_timeout_secs: parse_or(&non_empty, "LOGSCOPE_HTTP_TIMEOUT_SECS", 30)?,
        };

        cfg.validate()
            .map_err(|e| anyhow!("Invalid configuration: {e}"))?;
        Ok(cfg)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::seconds(self.cache_ttl_secs as i64))
    }

    pub fn entitlement_max_age(&self) -> Duration {
        Duration::seconds(self.entitlement_max_age_secs as i64)
    }

    pub fn entitlement_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.entitlement_poll_secs)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<LogScopeConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogScopeConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("LOGSCOPE_PROJECT_ID", "proj-1")]).unwrap();
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.cache_ttl(), Some(Duration::seconds(30)));
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.log_dir, None);
    }

    #[test]
    fn project_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("LOGSCOPE_PROJECT_ID"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(load(&[("LOGSCOPE_PROJECT_ID", "p"), ("LOGSCOPE_PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("LOGSCOPE_PROJECT_ID", "p"), ("LOGSCOPE_PAGE_SIZE", "abc")]).is_err());
        assert!(load(&[("LOGSCOPE_PROJECT_ID", "p"), ("LOGSCOPE_API_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let cfg = load(&[("LOGSCOPE_PROJECT_ID", "p"), ("LOGSCOPE_CACHE_TTL_SECS", "0")]).unwrap();
        assert_eq!(cfg.cache_ttl(), None);
    }
}
