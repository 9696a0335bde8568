use advisor_core::{
    Action, AdvisorConfig, DefaultPolicy, Direction, MarketContext, MarketState, NoTradeSignal,
    Severity, VixLevel,
};
use tracing::{info, warn};

/// VIX value above which a volatile market state escalates to a no-trade
/// condition.
const VOLATILE_VIX_FLOOR: f64 = 20.0;

const HIGH_SEVERITY_ACTION: &str =
    "Stay in cash. Avoid all new positions. Consider reducing existing positions if possible.";
const MEDIUM_SEVERITY_ACTION: &str =
    "Exercise extreme caution. Only consider high-conviction trades with tight stop losses. Prefer cash.";
const CLEAR_ACTION: &str = "Market conditions allow trading, but remain vigilant";

/// Detects market regimes dangerous enough to suppress new BUY
/// recommendations.
///
/// The gate fails open: missing context or a disabled detector always allows
/// trading, because missing data already reduces confidence elsewhere in the
/// pipeline.
pub struct NoTradeDetector {
    vix_spike_threshold: f64,
    index_drop_threshold: f64,
    enabled: bool,
    policy: DefaultPolicy,
}

impl NoTradeDetector {
    pub fn new(config: &AdvisorConfig, policy: DefaultPolicy) -> Self {
        info!(
            vix_spike_threshold = config.vix_spike_threshold,
            index_drop_threshold = config.index_drop_threshold,
            enabled = config.enable_no_trade,
            "no-trade detector initialized"
        );
        Self {
            vix_spike_threshold: config.vix_spike_threshold,
            index_drop_threshold: config.index_drop_threshold,
            enabled: config.enable_no_trade,
            policy,
        }
    }

    /// Evaluate the danger rules against the current market context.
    ///
    /// All matched rules contribute a reason; the signal's severity is the
    /// highest tier among the matches.
    pub fn check(&self, market_context: Option<&MarketContext>) -> NoTradeSignal {
        if !self.enabled {
            return self.policy.no_trade_inactive("");
        }

        let Some(ctx) = market_context else {
            warn!("no market context available, allowing trading");
            return self.policy.no_trade_inactive("No market context available");
        };

        let mut reasons = Vec::new();
        let mut severity = Severity::Low;

        // Bearish market with elevated volatility is the classic capital
        // destroyer.
        if ctx.market_state == MarketState::Bearish
            && matches!(ctx.vix_level, VixLevel::High | VixLevel::VeryHigh)
        {
            reasons.push(format!(
                "Market is bearish with {} volatility (VIX: {:.1})",
                ctx.vix_level.to_label().replace('_', " "),
                ctx.vix_value
            ));
            severity = Severity::High;
        }

        if ctx.vix_value > self.vix_spike_threshold {
            reasons.push(format!(
                "VIX spike detected: {:.1} (threshold: {:.1}) - extreme market fear",
                ctx.vix_value, self.vix_spike_threshold
            ));
            severity = Severity::High;
        }

        for (name, index) in [
            ("Primary index", &ctx.primary_index),
            ("Secondary index", &ctx.secondary_index),
        ] {
            let deviation = index.pct_vs_50dma();
            if deviation < -self.index_drop_threshold {
                reasons.push(format!(
                    "{} is {:.1}% below its 50-day moving average ({:.0} vs {:.0})",
                    name,
                    deviation.abs() * 100.0,
                    index.price,
                    index.ma_50
                ));
                severity = severity.max(Severity::Medium);
            }
        }

        if ctx.primary_index.trend == Direction::Bearish
            && ctx.secondary_index.trend == Direction::Bearish
            && matches!(
                ctx.vix_level,
                VixLevel::Moderate | VixLevel::High | VixLevel::VeryHigh
            )
        {
            reasons.push("Both tracked indices are bearish with elevated volatility".to_string());
            severity = severity.max(Severity::Medium);
        }

        if ctx.market_state == MarketState::Volatile && ctx.vix_value > VOLATILE_VIX_FLOOR {
            reasons.push(format!(
                "Market is highly volatile (VIX: {:.1})",
                ctx.vix_value
            ));
            severity = severity.max(Severity::Medium);
        }

        let is_no_trade = !reasons.is_empty();
        let suggested_action = if is_no_trade {
            match severity {
                Severity::High => HIGH_SEVERITY_ACTION,
                _ => MEDIUM_SEVERITY_ACTION,
            }
        } else {
            CLEAR_ACTION
        }
        .to_string();

        if is_no_trade {
            warn!(
                severity = severity.to_label(),
                reason_count = reasons.len(),
                "no-trade signal triggered"
            );
        }

        NoTradeSignal {
            is_no_trade,
            severity,
            reasons,
            suggested_action,
        }
    }

    /// Whether a recommendation should be suppressed. Only BUY is ever
    /// blocked; SELL and HOLD pass through in any regime.
    pub fn should_block_recommendation(
        &self,
        action: Action,
        market_context: Option<&MarketContext>,
    ) -> bool {
        if action != Action::Buy {
            return false;
        }

        let signal = self.check(market_context);
        if signal.is_no_trade {
            info!("blocking BUY recommendation due to no-trade signal");
            return true;
        }
        false
    }

    /// Coarse market safety score: 1.0 = safe, 0.0 = dangerous.
    pub fn market_safety_score(&self, market_context: Option<&MarketContext>) -> f64 {
        let Some(ctx) = market_context else {
            return 0.5;
        };

        let mut score: f64 = 1.0;

        score += match ctx.market_state {
            MarketState::Bearish => -0.3,
            MarketState::Volatile => -0.4,
            MarketState::Panic => -0.5,
            _ => 0.0,
        };

        score += match ctx.vix_level {
            VixLevel::VeryHigh => -0.4,
            VixLevel::High => -0.3,
            VixLevel::Moderate => -0.1,
            VixLevel::Low => 0.0,
        };

        let deviation = ctx.primary_index.pct_vs_50dma();
        if deviation < -0.05 {
            score -= 0.3;
        } else if deviation < -0.03 {
            score -= 0.2;
        }

        score.clamp(0.0, 1.0)
    }
}
