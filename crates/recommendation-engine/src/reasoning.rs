use advisor_core::{
    Action, FundamentalSnapshot, MarketContext, NoTradeSignal, RiskPenalties, SentimentSignal,
    SignalContributions, TechnicalSnapshot,
};

/// Descriptive label for a score in [-1, 1].
pub fn describe_score(score: f64) -> &'static str {
    if score > 0.5 {
        "Very bullish"
    } else if score > 0.2 {
        "Bullish"
    } else if score > -0.2 {
        "Neutral"
    } else if score > -0.5 {
        "Bearish"
    } else {
        "Very bearish"
    }
}

fn describe_market(ctx: &MarketContext) -> String {
    format!(
        "Market is {} with {} volatility (VIX: {:.1}). Primary index is {}, secondary index is {}.",
        ctx.market_state.to_label(),
        ctx.vix_level.to_label().replace('_', " "),
        ctx.vix_value,
        ctx.primary_index.trend.to_label(),
        ctx.secondary_index.trend.to_label(),
    )
}

fn dominant_analyzer(contributions: &SignalContributions) -> &'static str {
    let entries = [
        ("sentiment", contributions.sentiment.abs()),
        ("technical", contributions.technical.abs()),
        ("fundamental", contributions.fundamental.abs()),
    ];
    entries
        .iter()
        .fold(("sentiment", f64::MIN), |best, &(name, value)| {
            if value > best.1 {
                (name, value)
            } else {
                best
            }
        })
        .0
}

/// Deterministically compose the human-readable explanation for a
/// recommendation. Section order is fixed so identical inputs always yield
/// the identical string.
#[allow(clippy::too_many_arguments)]
pub fn compose_reasoning(
    action: Action,
    confidence: f64,
    raw_score: f64,
    adjusted_score: f64,
    contributions: &SignalContributions,
    penalties: &RiskPenalties,
    sentiment: &SentimentSignal,
    technical: &TechnicalSnapshot,
    fundamental: &FundamentalSnapshot,
    market_context: Option<&MarketContext>,
    no_trade: &NoTradeSignal,
    buy_blocked: bool,
    conflicting: bool,
) -> String {
    let mut parts = Vec::new();

    if buy_blocked {
        let mut warning = format!(
            "No-trade zone active ({} severity): {}",
            no_trade.severity.to_label(),
            no_trade.suggested_action
        );
        for reason in &no_trade.reasons {
            warning.push_str(&format!("\n- {reason}"));
        }
        warning.push_str("\nBUY signal downgraded to HOLD.");
        parts.push(warning);
    }

    parts.push(format!(
        "Recommendation: {} with {:.0}% confidence (raw score: {:+.2}, adjusted: {:+.2})",
        action.to_label(),
        confidence * 100.0,
        raw_score,
        adjusted_score,
    ));

    parts.push(format!(
        "Sentiment Analysis: {} (score: {:+.2}, confidence: {:.0}%, sources: {})",
        describe_score(sentiment.signal.score),
        sentiment.signal.score,
        sentiment.signal.confidence * 100.0,
        sentiment.source_count,
    ));

    parts.push(format!(
        "Technical Analysis: {} (score: {:+.2}, RSI: {:.1}, MACD: {:+.2})",
        describe_score(technical.signal.score),
        technical.signal.score,
        technical.rsi,
        technical.macd,
    ));

    let pe_info = match fundamental.pe_ratio {
        Some(pe) => format!("P/E: {pe:.1}"),
        None => "P/E: N/A".to_string(),
    };
    parts.push(format!(
        "Fundamental Analysis: {} (score: {:+.2}, {})",
        describe_score(fundamental.signal.score),
        fundamental.signal.score,
        pe_info,
    ));

    parts.push(format!(
        "Largest contribution came from the {} analyzer.",
        dominant_analyzer(contributions)
    ));

    if conflicting {
        parts.push(
            "Note: Conflicting signals detected between analyzers; holding until they align."
                .to_string(),
        );
    }

    if let Some(ctx) = market_context {
        if penalties.market != 0.0 || penalties.volatility != 0.0 {
            parts.push(format!(
                "Market Context: {} Risk penalties reduced the score by {:.2}.",
                describe_market(ctx),
                penalties.total().abs(),
            ));
        } else {
            parts.push(format!("Market Context: {}", describe_market(ctx)));
        }
    }

    if no_trade.is_no_trade && !buy_blocked {
        parts.push(format!(
            "Caution: no-trade conditions are active ({} severity): {}",
            no_trade.severity.to_label(),
            no_trade.reasons.join("; "),
        ));
    }

    let summary = match action {
        Action::Buy => "Overall: conditions favor opening a long position.",
        Action::Sell => "Overall: conditions favor exiting or avoiding the position.",
        Action::Hold => "Overall: conditions do not justify a new position either way.",
    };
    parts.push(summary.to_string());

    parts.join("\n\n")
}
