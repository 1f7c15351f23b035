//! Typed view over the merged configuration tree.
//!
//! Every key has a default, so an empty config is valid and yields: 60 s
//! TTL, Europe/Berlin, fail-safe fallback 12–17 weekdays, in-process settings
//! store. Unknown keys are rejected so typos surface at boot.

use std::time::Duration as StdDuration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;
use chrono_tz::Tz;
use hz_gate::{GateOptions, TimeRestrictionPolicy, DEFAULT_TTL_SECS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HortConfig {
    pub gate: GateSection,
    pub settings: SettingsSection,
    pub daemon: DaemonSection,
}

// ---------------------------------------------------------------------------
// gate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateSection {
    pub cache_ttl_secs: u32,
    /// IANA zone name whose wall clock decides weekday and hour.
    pub timezone: String,
    pub fallback_policy: PolicySection,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL_SECS as u32,
            timezone: "Europe/Berlin".to_string(),
            fallback_policy: PolicySection::default(),
        }
    }
}

/// snake_case YAML form of [`TimeRestrictionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySection {
    pub enabled: bool,
    pub block_start_hour: u32,
    pub block_end_hour: u32,
    pub block_weekdays_only: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        TimeRestrictionPolicy::FALLBACK.into()
    }
}

impl From<TimeRestrictionPolicy> for PolicySection {
    fn from(p: TimeRestrictionPolicy) -> Self {
        Self {
            enabled: p.enabled,
            block_start_hour: p.block_start_hour,
            block_end_hour: p.block_end_hour,
            block_weekdays_only: p.block_weekdays_only,
        }
    }
}

impl PolicySection {
    pub fn to_policy(self) -> TimeRestrictionPolicy {
        TimeRestrictionPolicy {
            enabled: self.enabled,
            block_start_hour: self.block_start_hour,
            block_end_hour: self.block_end_hour,
            block_weekdays_only: self.block_weekdays_only,
        }
    }
}

// ---------------------------------------------------------------------------
// settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// In-process admin store (served by hz-daemon itself).
    #[default]
    Memory,
    /// Remote settings API.
    Http,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsSection {
    pub source: SourceKind,
    /// Required when `source: http`.
    pub base_url: Option<String>,
    /// NAME of the env var holding the bearer token. Never the token itself.
    pub token_env: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Initial value of the in-process admin store.
    pub initial_policy: Option<PolicySection>,
}

impl SettingsSection {
    pub fn timeout(&self) -> Option<StdDuration> {
        self.timeout_secs.map(StdDuration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// daemon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSection {
    /// e.g. "127.0.0.1:8898". `HZ_DAEMON_ADDR` overrides.
    pub bind_addr: Option<String>,
}

// ---------------------------------------------------------------------------
// Construction + validation
// ---------------------------------------------------------------------------

impl HortConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: HortConfig =
            serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        self.gate
            .fallback_policy
            .to_policy()
            .validate()
            .map_err(|e| anyhow!("CONFIG_INVALID gate.fallback_policy: {e}"))?;

        if let Some(p) = self.settings.initial_policy {
            p.to_policy()
                .validate()
                .map_err(|e| anyhow!("CONFIG_INVALID settings.initial_policy: {e}"))?;
        }

        if self.settings.source == SourceKind::Http {
            match self.settings.base_url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => {}
                _ => bail!("CONFIG_INVALID settings.base_url: required when settings.source=http"),
            }
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.gate.timezone.parse::<Tz>().map_err(|_| {
            anyhow!(
                "CONFIG_INVALID gate.timezone: unknown timezone '{}'",
                self.gate.timezone
            )
        })
    }

    pub fn gate_options(&self) -> Result<GateOptions> {
        Ok(GateOptions {
            ttl: Duration::seconds(i64::from(self.gate.cache_ttl_secs)),
            timezone: self.timezone()?,
            fallback_policy: self.gate.fallback_policy.to_policy(),
        })
    }

    /// Starting value for the in-process admin store: `initial_policy` if
    /// set, otherwise the fallback policy.
    pub fn initial_store_policy(&self) -> TimeRestrictionPolicy {
        self.settings
            .initial_policy
            .unwrap_or(self.gate.fallback_policy)
            .to_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = HortConfig::from_json(&json!({})).unwrap();
        let opts = cfg.gate_options().unwrap();
        assert_eq!(opts.ttl, Duration::seconds(60));
        assert_eq!(opts.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(opts.fallback_policy, TimeRestrictionPolicy::FALLBACK);
        assert_eq!(cfg.settings.source, SourceKind::Memory);
    }

    #[test]
    fn http_source_requires_base_url() {
        let err = HortConfig::from_json(&json!({"settings": {"source": "http"}})).unwrap_err();
        assert!(err.to_string().contains("settings.base_url"));
    }

    #[test]
    fn unknown_timezone_rejected() {
        let err = HortConfig::from_json(&json!({"gate": {"timezone": "Mars/Olympus"}})).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(HortConfig::from_json(&json!({"gate": {"cache_ttl": 5}})).is_err());
    }

    #[test]
    fn invalid_fallback_hour_rejected() {
        let err = HortConfig::from_json(&json!({
            "gate": {"fallback_policy": {"block_end_hour": 30}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("gate.fallback_policy"));
    }

    #[test]
    fn initial_store_policy_defaults_to_fallback() {
        let cfg = HortConfig::from_json(&json!({
            "gate": {"fallback_policy": {"block_start_hour": 11}}
        }))
        .unwrap();
        assert_eq!(cfg.initial_store_policy().block_start_hour, 11);
    }
}
