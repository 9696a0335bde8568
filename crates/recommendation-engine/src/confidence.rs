use advisor_core::{
    ConfidenceBreakdown, Direction, FundamentalSnapshot, MarketContext, PenaltyContribution,
    SentimentSignal, TechnicalSnapshot, DIRECTION_THRESHOLD,
};
use tracing::debug;

// Agreement bands by number of aligned sources (out of 4).
const AGREEMENT_ALL: f64 = 0.85;
const AGREEMENT_THREE: f64 = 0.75;
const AGREEMENT_TWO: f64 = 0.65;
const AGREEMENT_SPLIT: f64 = 0.45;

// Confidence formula weights. Agreement dominates; the individual analyzer
// confidences and market favorability season the result.
const W_AGREEMENT: f64 = 0.60;
const W_SENTIMENT: f64 = 0.15;
const W_TECHNICAL: f64 = 0.10;
const W_FUNDAMENTAL: f64 = 0.10;
const W_FAVORABILITY: f64 = 0.05;

/// Bucket the four signal sources and score how many of them point the same
/// way. Returns the agreement band and the aligned-source count.
pub fn agreement_score(
    sentiment_score: f64,
    technical_score: f64,
    fundamental_score: f64,
    market_direction: Direction,
) -> (f64, usize) {
    let buckets = [
        Direction::from_score(sentiment_score, DIRECTION_THRESHOLD),
        Direction::from_score(technical_score, DIRECTION_THRESHOLD),
        Direction::from_score(fundamental_score, DIRECTION_THRESHOLD),
        market_direction,
    ];

    let aligned = [Direction::Bullish, Direction::Bearish, Direction::Neutral]
        .iter()
        .map(|d| buckets.iter().filter(|&b| b == d).count())
        .max()
        .unwrap_or(0);

    let score = match aligned {
        4 => AGREEMENT_ALL,
        3 => AGREEMENT_THREE,
        2 => AGREEMENT_TWO,
        _ => AGREEMENT_SPLIT,
    };

    (score, aligned)
}

/// Calibrated confidence for the final recommendation.
///
/// Measures how much the independent signal sources agree, not how
/// profitable the trade is likely to be. Market favorability (not signal
/// quality) is the market-side term in the blend; the data-quality penalty
/// scales the whole thing down.
#[allow(clippy::too_many_arguments)]
pub fn calculate_confidence(
    sentiment: &SentimentSignal,
    technical: &TechnicalSnapshot,
    fundamental: &FundamentalSnapshot,
    market_context: Option<&MarketContext>,
    neutral_signal_quality: f64,
    neutral_favorability: f64,
    data_quality_penalty: f64,
    penalty_contributions: Vec<PenaltyContribution>,
) -> (f64, ConfidenceBreakdown) {
    let market_direction = market_context
        .map(|ctx| ctx.market_state.direction())
        .unwrap_or(Direction::Neutral);

    let (agreement, aligned) = agreement_score(
        sentiment.signal.score,
        technical.signal.score,
        fundamental.signal.score,
        market_direction,
    );

    let (market_signal_quality, market_favorability) = match market_context {
        Some(ctx) => (ctx.market_signal_quality, ctx.market_favorability),
        None => (neutral_signal_quality, neutral_favorability),
    };

    let sentiment_confidence = sentiment.signal.confidence;
    let technical_confidence = technical.signal.confidence;
    let fundamental_confidence = fundamental.signal.confidence;

    let blended = agreement * W_AGREEMENT
        + sentiment_confidence * W_SENTIMENT
        + technical_confidence * W_TECHNICAL
        + fundamental_confidence * W_FUNDAMENTAL
        + market_favorability * W_FAVORABILITY;

    let confidence = (blended * (1.0 - data_quality_penalty)).clamp(0.0, 1.0);

    debug!(
        aligned,
        agreement,
        data_quality_penalty,
        confidence,
        "confidence calculated"
    );

    let breakdown = ConfidenceBreakdown {
        sentiment_confidence,
        technical_confidence,
        fundamental_confidence,
        market_signal_quality,
        market_favorability,
        agreement_score: agreement,
        data_quality_penalty,
        penalty_contributions,
    };

    (confidence, breakdown)
}
