use advisor_core::{
    FundamentalSnapshot, MarketContext, MarketState, NoTradeSignal, PenaltyContribution,
    RiskPenalties, SentimentSignal, Severity, VixLevel,
};
use tracing::debug;

/// Ceiling on the cumulative data-quality penalty.
pub const DATA_PENALTY_CAP: f64 = 0.30;

/// Build the ordered data-quality penalty ledger and its capped total.
///
/// Each entry names the data problem and its contribution; the cap is applied
/// once to the sum, so the ledger stays auditable even when it overflows the
/// ceiling.
pub fn data_quality_ledger(
    sentiment: &SentimentSignal,
    fundamental: &FundamentalSnapshot,
    has_market_context: bool,
) -> (f64, Vec<PenaltyContribution>) {
    let mut contributions = Vec::new();

    if !has_market_context {
        contributions.push(PenaltyContribution {
            name: "missing market context".to_string(),
            amount: 0.05,
        });
    }

    if sentiment.source_count < 2 {
        contributions.push(PenaltyContribution {
            name: "fewer than 2 sentiment sources".to_string(),
            amount: 0.10,
        });
    } else if sentiment.source_count < 3 {
        contributions.push(PenaltyContribution {
            name: "fewer than 3 sentiment sources".to_string(),
            amount: 0.05,
        });
    }

    match fundamental.missing_metric_count() {
        0 => {}
        1 => contributions.push(PenaltyContribution {
            name: "1 fundamental metric missing".to_string(),
            amount: 0.05,
        }),
        n => contributions.push(PenaltyContribution {
            name: format!("{n} fundamental metrics missing"),
            amount: 0.10,
        }),
    }

    // An exactly-zero sentiment with zero sources is a failed feed, not a
    // genuinely neutral reading.
    if sentiment.signal.score == 0.0 && sentiment.source_count == 0 {
        contributions.push(PenaltyContribution {
            name: "sentiment feed returned nothing".to_string(),
            amount: 0.15,
        });
    }

    let total: f64 = contributions.iter().map(|c| c.amount).sum();
    let capped = total.min(DATA_PENALTY_CAP);
    if total > capped {
        debug!(total, capped, "data-quality penalty capped");
    }

    (capped, contributions)
}

/// Penalty for taking a long position against an unfavorable market. Zero in
/// a bullish tape; otherwise scales with how unfavorable conditions are,
/// weighted by regime.
pub fn market_penalty(market_context: Option<&MarketContext>) -> f64 {
    let Some(ctx) = market_context else {
        return 0.0;
    };
    let k = match ctx.market_state {
        MarketState::Bullish => return 0.0,
        MarketState::Bearish | MarketState::Panic => 0.5,
        MarketState::Volatile => 0.3,
        MarketState::Neutral => 0.2,
    };
    -(1.0 - ctx.market_favorability) * k
}

pub fn no_trade_penalty(no_trade: &NoTradeSignal) -> f64 {
    if !no_trade.is_no_trade {
        return 0.0;
    }
    match no_trade.severity {
        Severity::High => -0.30,
        Severity::Medium => -0.20,
        Severity::Low => -0.10,
    }
}

pub fn volatility_penalty(market_context: Option<&MarketContext>) -> f64 {
    let Some(ctx) = market_context else {
        return 0.0;
    };
    match ctx.vix_level {
        VixLevel::Low => 0.0,
        VixLevel::Moderate => -0.05,
        VixLevel::High => -0.15,
        VixLevel::VeryHigh => -0.25,
    }
}

/// Assemble the full penalty cascade. Each term is independent and zero or
/// negative; the adjusted score is the raw score plus their sum.
pub fn risk_penalties(
    market_context: Option<&MarketContext>,
    no_trade: &NoTradeSignal,
    data_quality_penalty: f64,
) -> RiskPenalties {
    RiskPenalties {
        market: market_penalty(market_context),
        no_trade: no_trade_penalty(no_trade),
        volatility: volatility_penalty(market_context),
        data: -data_quality_penalty,
    }
}
