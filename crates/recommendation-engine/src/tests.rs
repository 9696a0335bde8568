use advisor_core::{
    Action, AdvisorConfig, AnalyzerSignal, DefaultPolicy, FundamentalSnapshot, IndexSummary,
    MarketContext, MarketState, NoTradeSignal, SentimentSignal, Severity, TechRegime,
    TechnicalSnapshot, VixLevel, WeightSource, NEUTRAL_DAMPING,
};
use chrono::{TimeZone, Utc};

use crate::engine::RecommendationEngine;

fn engine() -> RecommendationEngine {
    RecommendationEngine::new(AdvisorConfig::default()).unwrap()
}

fn sentiment(score: f64, confidence: f64, sources: usize) -> SentimentSignal {
    SentimentSignal {
        signal: AnalyzerSignal::from_score(score, confidence, 0.2, NEUTRAL_DAMPING),
        source_count: sources,
    }
}

fn technical(score: f64, confidence: f64) -> TechnicalSnapshot {
    TechnicalSnapshot {
        signal: AnalyzerSignal::from_score(score, confidence, 0.2, NEUTRAL_DAMPING),
        last_price: 100.0,
        rsi: 55.0,
        macd: 0.5,
        macd_signal: 0.3,
        ma_20: 98.0,
        ma_50: 96.0,
        ma_200: 90.0,
        atr: 1.5,
        support_levels: vec![94.0],
        resistance_levels: vec![108.0],
        volume_ratio: Some(1.1),
        regime: TechRegime::Consolidation,
    }
}

fn fundamental(score: f64, confidence: f64) -> FundamentalSnapshot {
    FundamentalSnapshot {
        signal: AnalyzerSignal::from_score(score, confidence, 0.3, NEUTRAL_DAMPING),
        pe_ratio: Some(21.0),
        pb_ratio: Some(2.4),
        debt_to_equity: Some(0.9),
        eps: Some(4.5),
        revenue_growth: Some(6.0),
    }
}

fn context(state: MarketState, vix: f64, favorability: f64) -> MarketContext {
    let (primary, secondary) = match state {
        MarketState::Bullish => (
            IndexSummary::new(105.0, 102.0, 100.0, None),
            IndexSummary::new(105.0, 102.0, 100.0, None),
        ),
        MarketState::Bearish | MarketState::Panic => (
            IndexSummary::new(95.0, 98.0, 100.0, None),
            IndexSummary::new(95.0, 98.0, 100.0, None),
        ),
        _ => (
            IndexSummary::new(100.0, 99.0, 100.5, None),
            IndexSummary::new(100.0, 99.0, 100.5, None),
        ),
    };
    MarketContext {
        market_state: state,
        vix_level: VixLevel::from_value(vix),
        vix_value: vix,
        primary_index: primary,
        secondary_index: secondary,
        market_signal_quality: 0.7,
        market_favorability: favorability,
        as_of: Utc.with_ymd_and_hms(2024, 6, 3, 15, 30, 0).unwrap(),
    }
}

fn inactive_no_trade() -> NoTradeSignal {
    DefaultPolicy::default().no_trade_inactive("")
}

fn active_no_trade(severity: Severity) -> NoTradeSignal {
    NoTradeSignal {
        is_no_trade: true,
        severity,
        reasons: vec!["Market is bearish with high volatility".to_string()],
        suggested_action: "Prefer cash".to_string(),
    }
}

// Aligned bullish signals in a bullish, calm market: clean BUY with
// dynamic-bullish weights, no penalties, strong confidence.
#[test]
fn test_aligned_bullish_scenario() {
    let ctx = context(MarketState::Bullish, 12.0, 0.85);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.45, 0.80, 5),
        &technical(0.38, 0.78),
        &fundamental(0.52, 0.90),
        Some(&ctx),
        &inactive_no_trade(),
    );

    assert_eq!(rec.action, Action::Buy);
    assert_eq!(rec.runtime_weights.source, WeightSource::DynamicBullish);
    assert!((rec.runtime_weights.weights.sentiment - 0.30).abs() < 1e-12);
    assert!((rec.runtime_weights.weights.technical - 0.40).abs() < 1e-12);
    assert!((rec.runtime_weights.weights.fundamental - 0.30).abs() < 1e-12);

    let expected_raw = 0.45 * 0.30 + 0.38 * 0.40 + 0.52 * 0.30;
    assert!((rec.raw_score - expected_raw).abs() < 1e-9);
    assert!((rec.penalties.total()).abs() < 1e-12);
    assert!((rec.adjusted_score - rec.raw_score).abs() < 1e-9);

    assert!(rec.confidence > 0.75);
    assert!(rec.entry_range.is_some());
    assert!(rec.exit_range.is_none());
    assert!(rec.trade_levels.is_some());
}

// Same analyzer readings but a bearish market with an active no-trade zone:
// defensive weights, itemized penalties, HOLD.
#[test]
fn test_bearish_no_trade_scenario() {
    let ctx = context(MarketState::Bearish, 17.0, 0.40);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.45, 0.80, 5),
        &technical(0.38, 0.78),
        &fundamental(0.52, 0.90),
        Some(&ctx),
        &active_no_trade(Severity::Medium),
    );

    assert_eq!(rec.runtime_weights.source, WeightSource::DynamicBearish);
    assert!((rec.runtime_weights.weights.sentiment - 0.15).abs() < 1e-12);
    assert!((rec.runtime_weights.weights.fundamental - 0.50).abs() < 1e-12);

    assert!((rec.penalties.market + 0.30).abs() < 1e-9);
    assert!((rec.penalties.no_trade + 0.20).abs() < 1e-9);

    assert_eq!(rec.action, Action::Hold);
    assert!(rec.reasoning.contains("no-trade"));
    assert!(rec.reasoning.contains("bearish"));
    assert!(rec.entry_range.is_none());
}

// A BUY-strength adjusted score inside an active no-trade zone is downgraded
// to HOLD with the warning and reasons up front.
#[test]
fn test_no_trade_blocks_buy() {
    let ctx = context(MarketState::Bearish, 14.0, 0.40);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.9, 0.8, 5),
        &technical(0.8, 0.8),
        &fundamental(0.9, 0.9),
        Some(&ctx),
        &active_no_trade(Severity::Low),
    );

    // adjusted = 0.865 - 0.30 (market) - 0.10 (no-trade) = 0.465, over the
    // BUY threshold, blocked anyway
    assert!(rec.adjusted_score > engine().config().action_threshold);
    assert_eq!(rec.action, Action::Hold);
    assert!(rec.reasoning.starts_with("No-trade zone active"));
    assert!(rec.reasoning.contains("downgraded to HOLD"));
    assert!(rec.entry_range.is_none());
    assert!(rec.trade_levels.is_none());
}

// SELL is never blocked by the no-trade gate.
#[test]
fn test_no_trade_never_blocks_sell() {
    let ctx = context(MarketState::Bearish, 28.0, 0.30);
    let rec = engine().generate(
        "ACME",
        &sentiment(-0.8, 0.8, 5),
        &technical(-0.7, 0.8),
        &fundamental(-0.9, 0.9),
        Some(&ctx),
        &active_no_trade(Severity::High),
    );

    assert_eq!(rec.action, Action::Sell);
    assert!(rec.exit_range.is_some());
    assert!(rec.entry_range.is_none());
}

// Conflicting analyzer signals force HOLD even when the adjusted score would
// otherwise clear the BUY threshold.
#[test]
fn test_conflicting_signals_force_hold() {
    let ctx = context(MarketState::Bullish, 12.0, 0.85);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.9, 0.8, 5),
        &technical(-0.5, 0.8),
        &fundamental(0.9, 0.9),
        Some(&ctx),
        &inactive_no_trade(),
    );

    assert!(rec.adjusted_score > 0.3);
    assert_eq!(rec.action, Action::Hold);
    assert!(rec.reasoning.contains("Conflicting signals"));
}

#[test]
fn test_conflicting_signals_spread_example() {
    // The classic disagreement triple: +0.8, -0.7, +0.1
    let ctx = context(MarketState::Neutral, 14.0, 0.5);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.8, 0.8, 5),
        &technical(-0.7, 0.8),
        &fundamental(0.1, 0.9),
        Some(&ctx),
        &inactive_no_trade(),
    );

    assert_eq!(rec.action, Action::Hold);
    assert!(rec.reasoning.contains("Conflicting signals"));
}

// Missing market context: static config weights and the flat data penalty.
#[test]
fn test_missing_context_uses_static_weights() {
    let rec = engine().generate(
        "ACME",
        &sentiment(0.45, 0.80, 5),
        &technical(0.38, 0.78),
        &fundamental(0.52, 0.90),
        None,
        &inactive_no_trade(),
    );

    assert_eq!(rec.runtime_weights.source, WeightSource::Static);
    assert!((rec.runtime_weights.weights.sentiment - 0.50).abs() < 1e-12);
    assert!((rec.penalties.data + 0.05).abs() < 1e-12);
    assert!((rec.penalties.market).abs() < 1e-12);
    assert_eq!(rec.confidence_breakdown.penalty_contributions.len(), 1);
}

// Everything missing at once: the engine still produces a recommendation,
// with the data penalty capped and confidence floored rather than an error.
#[test]
fn test_fully_degraded_inputs_still_produce_recommendation() {
    let rec = engine().generate(
        "GHOST",
        &SentimentSignal::degraded(),
        &TechnicalSnapshot::degraded(),
        &FundamentalSnapshot::degraded(),
        None,
        &inactive_no_trade(),
    );

    assert_eq!(rec.action, Action::Hold);
    assert!((rec.penalties.data + 0.30).abs() < 1e-12);
    assert!((0.0..=1.0).contains(&rec.confidence));
    assert!(rec.entry_range.is_none());
    assert!(rec.exit_range.is_none());
}

// Increasing no-trade severity monotonically decreases the adjusted score.
#[test]
fn test_penalty_monotonicity_in_severity() {
    let ctx = context(MarketState::Neutral, 12.0, 0.5);
    let run = |no_trade: &NoTradeSignal| {
        engine()
            .generate(
                "ACME",
                &sentiment(0.5, 0.8, 5),
                &technical(0.4, 0.8),
                &fundamental(0.6, 0.9),
                Some(&ctx),
                no_trade,
            )
            .adjusted_score
    };

    let inactive = run(&inactive_no_trade());
    let low = run(&active_no_trade(Severity::Low));
    let medium = run(&active_no_trade(Severity::Medium));
    let high = run(&active_no_trade(Severity::High));

    assert!(inactive > low);
    assert!(low > medium);
    assert!(medium > high);
}

// Confidence stays in [0, 1] across a broad sweep of inputs.
#[test]
fn test_confidence_bounds_sweep() {
    let engine = engine();
    let scores = [-1.0, -0.5, 0.0, 0.45, 1.0];
    let confidences = [0.0, 0.5, 1.0];
    let contexts = [
        None,
        Some(context(MarketState::Bullish, 12.0, 0.85)),
        Some(context(MarketState::Bearish, 23.0, 0.35)),
        Some(context(MarketState::Volatile, 27.0, 0.25)),
        Some(context(MarketState::Panic, 40.0, 0.10)),
    ];

    for &s in &scores {
        for &t in &scores {
            for &f in &scores {
                for &c in &confidences {
                    for ctx in &contexts {
                        for sources in [0usize, 5] {
                            let rec = engine.generate(
                                "SWEEP",
                                &sentiment(s, c, sources),
                                &technical(t, c),
                                &fundamental(f, c),
                                ctx.as_ref(),
                                &inactive_no_trade(),
                            );
                            assert!(
                                (0.0..=1.0).contains(&rec.confidence),
                                "confidence {} out of bounds",
                                rec.confidence
                            );
                            let b = &rec.confidence_breakdown;
                            for value in [
                                b.sentiment_confidence,
                                b.technical_confidence,
                                b.fundamental_confidence,
                                b.market_signal_quality,
                                b.market_favorability,
                                b.agreement_score,
                            ] {
                                assert!((0.0..=1.0).contains(&value));
                            }
                            assert!(b.data_quality_penalty <= 0.30 + 1e-12);
                        }
                    }
                }
            }
        }
    }
}

// Identical inputs yield bit-identical output.
#[test]
fn test_determinism() {
    let ctx = context(MarketState::Volatile, 26.0, 0.30);
    let engine = engine();
    let run = || {
        engine.generate(
            "ACME",
            &sentiment(0.45, 0.80, 4),
            &technical(-0.25, 0.78),
            &fundamental(0.12, 0.90),
            Some(&ctx),
            &active_no_trade(Severity::Medium),
        )
    };

    let first = serde_json::to_string(&run()).unwrap();
    let second = serde_json::to_string(&run()).unwrap();
    assert_eq!(first, second);
}

// A valid performance-tracker override replaces the dynamic table entirely.
#[test]
fn test_weight_override_applies() {
    let ctx = context(MarketState::Bullish, 12.0, 0.85);
    let override_weights = advisor_core::WeightTriple {
        sentiment: 0.20,
        technical: 0.30,
        fundamental: 0.50,
    };
    let engine = engine().with_weight_override(Some(override_weights));
    let rec = engine.generate(
        "ACME",
        &sentiment(0.45, 0.80, 5),
        &technical(0.38, 0.78),
        &fundamental(0.52, 0.90),
        Some(&ctx),
        &inactive_no_trade(),
    );

    assert_eq!(rec.runtime_weights.source, WeightSource::Override);
    let expected_raw = 0.45 * 0.20 + 0.38 * 0.30 + 0.52 * 0.50;
    assert!((rec.raw_score - expected_raw).abs() < 1e-9);
}

#[test]
fn test_contributions_sum_to_raw_score() {
    let ctx = context(MarketState::Neutral, 17.0, 0.55);
    let rec = engine().generate(
        "ACME",
        &sentiment(0.3, 0.7, 3),
        &technical(-0.1, 0.6),
        &fundamental(0.4, 0.8),
        Some(&ctx),
        &inactive_no_trade(),
    );
    let sum =
        rec.contributions.sentiment + rec.contributions.technical + rec.contributions.fundamental;
    assert!((rec.raw_score - sum).abs() < 1e-12);
}

#[test]
fn test_invalid_configuration_rejected() {
    let config = AdvisorConfig {
        sentiment_weight: 2.0,
        technical_weight: -0.5,
        fundamental_weight: -0.5,
        ..Default::default()
    };
    assert!(RecommendationEngine::new(config).is_err());
}
