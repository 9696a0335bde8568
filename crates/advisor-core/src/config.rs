use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AdvisorError;
use crate::types::WeightTriple;

fn default_sentiment_weight() -> f64 {
    0.5
}
fn default_technical_weight() -> f64 {
    0.3
}
fn default_fundamental_weight() -> f64 {
    0.2
}
fn default_action_threshold() -> f64 {
    0.3
}
fn default_conflict_std_dev_threshold() -> f64 {
    0.5
}
fn default_neutral_damping() -> f64 {
    0.3
}
fn default_vix_spike_threshold() -> f64 {
    25.0
}
fn default_index_drop_threshold() -> f64 {
    0.03
}
fn default_enable_no_trade() -> bool {
    true
}
fn default_context_cache_ttl_secs() -> u64 {
    900
}

/// Advisor settings. Weight fields are the static fallback applied when no
/// market context is available; the engine selects regime-dependent weights
/// otherwise.
///
/// The empirically-tuned thresholds (action threshold, conflict std-dev,
/// neutral damping) are carried as configuration rather than hardcoded, but
/// their defaults are product decisions and not meant to be re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_sentiment_weight")]
    pub sentiment_weight: f64,
    #[serde(default = "default_technical_weight")]
    pub technical_weight: f64,
    #[serde(default = "default_fundamental_weight")]
    pub fundamental_weight: f64,

    /// Symmetric score threshold separating BUY/SELL from HOLD.
    #[serde(default = "default_action_threshold")]
    pub action_threshold: f64,
    /// Std-dev of the three analyzer scores above which the engine forces HOLD.
    #[serde(default = "default_conflict_std_dev_threshold")]
    pub conflict_std_dev_threshold: f64,
    /// Strength multiplier for neutral-direction signals.
    #[serde(default = "default_neutral_damping")]
    pub neutral_damping: f64,

    /// VIX value above which the no-trade detector fires its spike rule.
    #[serde(default = "default_vix_spike_threshold")]
    pub vix_spike_threshold: f64,
    /// Fractional drop below the 50-day MA that marks an index as broken.
    #[serde(default = "default_index_drop_threshold", alias = "nifty_drop_threshold")]
    pub index_drop_threshold: f64,
    #[serde(default = "default_enable_no_trade")]
    pub enable_no_trade: bool,

    #[serde(default = "default_context_cache_ttl_secs")]
    pub context_cache_ttl_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            sentiment_weight: default_sentiment_weight(),
            technical_weight: default_technical_weight(),
            fundamental_weight: default_fundamental_weight(),
            action_threshold: default_action_threshold(),
            conflict_std_dev_threshold: default_conflict_std_dev_threshold(),
            neutral_damping: default_neutral_damping(),
            vix_spike_threshold: default_vix_spike_threshold(),
            index_drop_threshold: default_index_drop_threshold(),
            enable_no_trade: default_enable_no_trade(),
            context_cache_ttl_secs: default_context_cache_ttl_secs(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from a JSON file. A missing file yields defaults;
    /// a present-but-invalid file is a hard error, since bad weights indicate
    /// operator error rather than transient data trouble.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AdvisorError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdvisorError::InvalidConfiguration(format!("read {}: {e}", path.display())))?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| AdvisorError::InvalidConfiguration(format!("parse {}: {e}", path.display())))?;

        config.normalize_weights()?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AdvisorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AdvisorError::InvalidConfiguration(format!("create {}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| AdvisorError::InvalidConfiguration(e.to_string()))?;
        std::fs::write(path, raw)
            .map_err(|e| AdvisorError::InvalidConfiguration(format!("write {}: {e}", path.display())))
    }

    /// Scale the static weights so they sum to 1.0. All-zero weights cannot
    /// be normalized and are rejected.
    pub fn normalize_weights(&mut self) -> Result<(), AdvisorError> {
        let total = self.sentiment_weight + self.technical_weight + self.fundamental_weight;
        if total <= 0.0 {
            return Err(AdvisorError::InvalidConfiguration(
                "analysis weights sum to zero, cannot normalize".to_string(),
            ));
        }
        if (total - 1.0).abs() > WeightTriple::SUM_TOLERANCE {
            info!(total, "static weights do not sum to 1.0, normalizing");
            self.sentiment_weight /= total;
            self.technical_weight /= total;
            self.fundamental_weight /= total;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AdvisorError> {
        let weights = [
            ("sentiment_weight", self.sentiment_weight),
            ("technical_weight", self.technical_weight),
            ("fundamental_weight", self.fundamental_weight),
        ];
        for (name, w) in weights {
            if !(0.0..=1.0).contains(&w) || !w.is_finite() {
                return Err(AdvisorError::InvalidConfiguration(format!(
                    "{name} must be in [0.0, 1.0], got {w}"
                )));
            }
        }
        if !self.static_weights().is_normalized() {
            return Err(AdvisorError::InvalidConfiguration(format!(
                "analysis weights must sum to 1.0, got {}",
                self.static_weights().sum()
            )));
        }
        if self.action_threshold <= 0.0 || self.action_threshold >= 1.0 {
            return Err(AdvisorError::InvalidConfiguration(format!(
                "action_threshold must be in (0.0, 1.0), got {}",
                self.action_threshold
            )));
        }
        if self.vix_spike_threshold <= 0.0 {
            return Err(AdvisorError::InvalidConfiguration(
                "vix_spike_threshold must be positive".to_string(),
            ));
        }
        if self.index_drop_threshold <= 0.0 {
            return Err(AdvisorError::InvalidConfiguration(
                "index_drop_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The static fallback weight set.
    pub fn static_weights(&self) -> WeightTriple {
        WeightTriple {
            sentiment: self.sentiment_weight,
            technical: self.technical_weight,
            fundamental: self.fundamental_weight,
        }
    }
}
