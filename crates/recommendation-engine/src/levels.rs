use advisor_core::{PriceRange, TechnicalSnapshot, TradeLevels};

/// Default band around the current price when no technical levels exist.
const DEFAULT_BAND: f64 = 0.02;

/// Capital risked per trade, percent.
const RISK_PER_TRADE_PERCENT: f64 = 1.5;

/// Ceiling on a single position, percent of capital.
const MAX_POSITION_PERCENT: f64 = 10.0;

/// Minimum reward-to-risk ratio for a published target.
const MIN_RISK_REWARD: f64 = 2.0;

/// Entry band for a BUY: from the nearest support below the current price up
/// to a small premium over it, falling back to a symmetric ±2% band.
pub fn entry_range(current_price: f64, technical: &TechnicalSnapshot) -> PriceRange {
    let nearest_support = technical
        .support_levels
        .iter()
        .copied()
        .filter(|&s| s < current_price)
        .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));

    match nearest_support {
        Some(support) => PriceRange {
            low: support,
            high: current_price * (1.0 + DEFAULT_BAND),
        },
        None => PriceRange {
            low: current_price * (1.0 - DEFAULT_BAND),
            high: current_price * (1.0 + DEFAULT_BAND),
        },
    }
}

/// Exit band for a SELL: from a small discount under the current price up to
/// the nearest resistance above it, falling back to the ±2% band.
pub fn exit_range(current_price: f64, technical: &TechnicalSnapshot) -> PriceRange {
    let nearest_resistance = technical
        .resistance_levels
        .iter()
        .copied()
        .filter(|&r| r > current_price)
        .fold(None::<f64>, |acc, r| Some(acc.map_or(r, |a| a.min(r))));

    PriceRange {
        low: current_price * (1.0 - DEFAULT_BAND),
        high: nearest_resistance.unwrap_or(current_price * (1.0 + DEFAULT_BAND)),
    }
}

/// Precise BUY levels: entry near support, stop under it (or ATR-based),
/// target at no worse than 1:2 risk-reward, position sized so the trade risks
/// 1.5% of capital at most.
pub fn trade_levels(current_price: f64, technical: &TechnicalSnapshot) -> Option<TradeLevels> {
    if current_price <= 0.0 {
        return None;
    }

    let supports_below = |limit: f64| {
        technical
            .support_levels
            .iter()
            .copied()
            .filter(move |&s| s < limit)
            .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))))
    };

    // Entry slightly above the nearest support, never chasing the price.
    let ideal_entry = match supports_below(current_price) {
        Some(support) => support * 1.005,
        None => current_price * (1.0 - DEFAULT_BAND),
    };
    let ideal_entry = ideal_entry.min(current_price * 0.99);

    let atr_stop = if technical.atr > 0.0 {
        ideal_entry - technical.atr * 1.5
    } else {
        ideal_entry * 0.95
    };
    let stop_loss = match supports_below(ideal_entry) {
        // The tighter of the two stops wins
        Some(support) => atr_stop.max(support * 0.995),
        None => atr_stop,
    };
    // Never risk more than 8% below entry
    let stop_loss = stop_loss.max(ideal_entry * 0.92);

    let risk_per_share = ideal_entry - stop_loss;
    if risk_per_share <= 0.0 {
        return None;
    }

    let mut target = ideal_entry + risk_per_share * MIN_RISK_REWARD;
    let nearest_resistance = technical
        .resistance_levels
        .iter()
        .copied()
        .filter(|&r| r > ideal_entry)
        .fold(None::<f64>, |acc, r| Some(acc.map_or(r, |a| a.min(r))));
    if let Some(resistance) = nearest_resistance {
        if resistance > target {
            target = resistance * 0.995;
        } else {
            target = target.max(resistance * 1.02);
        }
    }

    let mut risk_reward_ratio = (target - ideal_entry) / risk_per_share;
    if risk_reward_ratio < MIN_RISK_REWARD {
        target = ideal_entry + risk_per_share * MIN_RISK_REWARD;
        risk_reward_ratio = MIN_RISK_REWARD;
    }

    let risk_fraction_percent = risk_per_share / ideal_entry * 100.0;
    let position_size_percent =
        (RISK_PER_TRADE_PERCENT / risk_fraction_percent * 100.0).min(MAX_POSITION_PERCENT);

    Some(TradeLevels {
        ideal_entry,
        stop_loss,
        target,
        risk_per_trade_percent: RISK_PER_TRADE_PERCENT,
        risk_reward_ratio,
        position_size_percent,
    })
}
