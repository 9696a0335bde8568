use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    IndexSummary, MarketContext, MarketState, NoTradeSignal, Severity, VixLevel,
};

/// Centralized fail-safe defaults for unavailable data.
///
/// Every "data is missing, keep going" substitution in the pipeline flows
/// through this record: market context fails neutral, the no-trade gate fails
/// open. Callers pass it down the chain so tests can assert on the policy
/// itself instead of chasing scattered fallbacks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DefaultPolicy {
    /// Signal quality assumed when no market data is available.
    pub neutral_signal_quality: f64,
    /// Favorability assumed when no market data is available.
    pub neutral_favorability: f64,
    /// VIX value substituted when the volatility index cannot be fetched.
    pub fallback_vix: f64,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            neutral_signal_quality: 0.5,
            neutral_favorability: 0.5,
            fallback_vix: 18.0,
        }
    }
}

impl DefaultPolicy {
    /// Neutral stand-in context used when market data cannot be fetched.
    /// Downstream consumers proceed with reduced confidence instead of
    /// failing the whole analysis.
    pub fn neutral_context(&self, as_of: DateTime<Utc>) -> MarketContext {
        MarketContext {
            market_state: MarketState::Neutral,
            vix_level: VixLevel::from_value(self.fallback_vix),
            vix_value: self.fallback_vix,
            primary_index: IndexSummary::new(0.0, 0.0, 0.0, None),
            secondary_index: IndexSummary::new(0.0, 0.0, 0.0, None),
            market_signal_quality: self.neutral_signal_quality,
            market_favorability: self.neutral_favorability,
            as_of,
        }
    }

    /// Fail-open no-trade signal: missing data never blocks trading, since
    /// the missing data already reduces confidence elsewhere.
    pub fn no_trade_inactive(&self, reason: &str) -> NoTradeSignal {
        NoTradeSignal {
            is_no_trade: false,
            severity: Severity::Low,
            reasons: if reason.is_empty() {
                Vec::new()
            } else {
                vec![reason.to_string()]
            },
            suggested_action: "Proceed with caution".to_string(),
        }
    }
}
