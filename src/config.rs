//! Engine configuration, loaded from TOML.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;
use crate::prelude::Result;
use crate::pricing::{RuleCache, RuleStore, DEFAULT_ALLOWANCE};
use crate::Error;

/// Configuration for pricing and provider calls.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    /// Merchant whose rule overrides apply. Global rules only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,

    /// How long a fetched rule table stays fresh
    #[serde(default = "default_rule_cache_ttl_secs")]
    pub rule_cache_ttl_secs: u64,

    /// Response ceiling for render calls
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    /// Response ceiling for analysis calls
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,

    /// Allowance used when the rule table carries none
    #[serde(default = "default_fallback_allowance")]
    pub fallback_allowance: f64,

    #[serde(default)]
    pub logging: LogConfig,
}

fn default_rule_cache_ttl_secs() -> u64 {
    300
}

fn default_render_timeout_secs() -> u64 {
    60
}

fn default_analysis_timeout_secs() -> u64 {
    60
}

fn default_fallback_allowance() -> f64 {
    DEFAULT_ALLOWANCE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            merchant_id: None,
            rule_cache_ttl_secs: default_rule_cache_ttl_secs(),
            render_timeout_secs: default_render_timeout_secs(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
            fallback_allowance: default_fallback_allowance(),
            logging: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable caching, timeouts or discounts.
    pub fn validate(&self) -> Result<()> {
        if self.rule_cache_ttl_secs == 0 {
            return Err(Error::Config(
                "rule_cache_ttl_secs must be > 0".to_string(),
            ));
        }
        if self.render_timeout_secs == 0 {
            return Err(Error::Config(
                "render_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.analysis_timeout_secs == 0 {
            return Err(Error::Config(
                "analysis_timeout_secs must be > 0".to_string(),
            ));
        }
        if !self.fallback_allowance.is_finite() || self.fallback_allowance < 0.0 {
            return Err(Error::Config(format!(
                "fallback_allowance must be >= 0.0, got {}",
                self.fallback_allowance
            )));
        }
        if self.merchant_id.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(Error::Config(
                "merchant_id must not be blank; omit it for global rules".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rule_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.rule_cache_ttl_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Rule cache configured with this TTL and allowance.
    pub fn rule_cache<S: RuleStore>(&self, store: S) -> RuleCache<S> {
        RuleCache::new(store)
            .with_ttl(self.rule_cache_ttl())
            .with_fallback_allowance(self.fallback_allowance)
    }

    /// Like [`EngineConfig::rule_cache`] with an injected clock.
    pub fn rule_cache_with_clock<S: RuleStore>(
        &self,
        store: S,
        clock: Arc<dyn crate::pricing::Clock>,
    ) -> RuleCache<S> {
        RuleCache::with_clock(store, clock)
            .with_ttl(self.rule_cache_ttl())
            .with_fallback_allowance(self.fallback_allowance)
    }
}
