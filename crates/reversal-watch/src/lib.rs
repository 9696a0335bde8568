use advisor_core::{
    FundamentalSnapshot, MarketContext, MarketState, ReversalStatus, ReversalTrigger,
    ReversalWatch, TechRegime, TechnicalSnapshot,
};
use tracing::{debug, info};

/// RSI level above which the oversold reading is considered to be recovering.
const RSI_RECOVERY: f64 = 30.0;

/// Volume multiple over the 20-day average that counts as a spike.
const VOLUME_SPIKE_RATIO: f64 = 1.5;

/// VIX above this is outright market panic.
const PANIC_VIX: f64 = 30.0;

/// VIX above this inside a volatile market also counts as panic.
const VOLATILE_PANIC_VIX: f64 = 25.0;

// Fundamental quality gate: at least "fair" valuations.
const MAX_PE: f64 = 30.0;
const MAX_PB: f64 = 5.0;
const MAX_DEBT_TO_EQUITY: f64 = 2.0;
const MIN_REVENUE_GROWTH: f64 = -10.0;

/// Flags candidate mean-reversion setups: a stock that is technically
/// oversold but fundamentally sound, in a market that is not panicking.
///
/// Produces nothing unless all three preconditions hold; the main
/// recommendation path is unaffected either way.
pub struct ReversalWatchDetector;

impl ReversalWatchDetector {
    pub fn new() -> Self {
        Self
    }

    /// Check for a reversal setup. Returns `None` when any precondition
    /// fails (not in the oversold zone, weak fundamentals, or market panic).
    pub fn detect(
        &self,
        symbol: &str,
        technical: &TechnicalSnapshot,
        fundamental: &FundamentalSnapshot,
        market_context: Option<&MarketContext>,
    ) -> Option<ReversalWatch> {
        if technical.regime != TechRegime::OversoldZone {
            debug!(
                symbol,
                regime = technical.regime.to_label(),
                "not in oversold zone, no reversal watch"
            );
            return None;
        }

        let fundamentals = match Self::check_fundamental_quality(fundamental) {
            Ok(reason) => reason,
            Err(reason) => {
                debug!(symbol, %reason, "oversold but poor fundamentals");
                return None;
            }
        };

        if let Some(reason) = Self::check_market_panic(market_context) {
            debug!(symbol, %reason, "oversold with fair fundamentals but market panic");
            return None;
        }

        let triggers = Self::check_triggers(technical);
        let met = triggers.iter().filter(|t| t.met).count();
        let total = triggers.len();

        let (status, confidence) = match met {
            n if n == total => (ReversalStatus::Triggered, 0.85),
            2 => (ReversalStatus::WatchOnly, 0.65),
            1 => (ReversalStatus::WatchOnly, 0.55),
            _ => (ReversalStatus::WatchOnly, 0.45),
        };

        let mut reasons = vec![
            "In oversold zone".to_string(),
            fundamentals,
            match market_context {
                Some(ctx) => format!("Market not in panic (VIX: {:.1})", ctx.vix_value),
                None => "No market context available (assuming not panic)".to_string(),
            },
        ];
        reasons.push(match status {
            ReversalStatus::Triggered => format!("All {total} reversal triggers met"),
            ReversalStatus::WatchOnly => format!("{met}/{total} reversal triggers met - watch closely"),
        });

        info!(
            symbol,
            status = status.to_label(),
            triggers = format!("{met}/{total}"),
            confidence,
            "reversal setup detected"
        );

        Some(ReversalWatch {
            symbol: symbol.to_string(),
            status,
            triggers,
            confidence,
            reasoning: reasons.join("\n"),
        })
    }

    /// Fundamentals must be at least fair: not overvalued, manageable debt,
    /// revenue not collapsing. A missing optional metric does not fail the
    /// gate; only a present-and-bad value does.
    fn check_fundamental_quality(fundamental: &FundamentalSnapshot) -> Result<String, String> {
        if fundamental.signal.score < 0.0 {
            return Err("Fundamental score is negative (poor fundamentals)".to_string());
        }

        let mut notes = Vec::new();

        if let Some(pe) = fundamental.pe_ratio {
            if pe > MAX_PE {
                return Err(format!("P/E ratio too high ({pe:.1} > {MAX_PE})"));
            }
            notes.push(format!("P/E: {pe:.1}"));
        }

        if let Some(pb) = fundamental.pb_ratio {
            if pb > MAX_PB {
                return Err(format!("P/B ratio too high ({pb:.1} > {MAX_PB})"));
            }
            notes.push(format!("P/B: {pb:.1}"));
        }

        if let Some(de) = fundamental.debt_to_equity {
            if de > MAX_DEBT_TO_EQUITY {
                return Err(format!(
                    "Debt-to-equity too high ({de:.1} > {MAX_DEBT_TO_EQUITY})"
                ));
            }
            notes.push(format!("D/E: {de:.1}"));
        }

        if let Some(growth) = fundamental.revenue_growth {
            if growth < MIN_REVENUE_GROWTH {
                return Err(format!(
                    "Revenue declining rapidly ({growth:.1}% < {MIN_REVENUE_GROWTH}%)"
                ));
            }
            notes.push(format!("Revenue growth: {growth:.1}%"));
        }

        if notes.is_empty() {
            Ok("Fundamentals are acceptable".to_string())
        } else {
            Ok(format!("Fair fundamentals: {}", notes.join(", ")))
        }
    }

    /// A panicking market suppresses reversal setups entirely; catching a
    /// falling knife in a crash is a different trade.
    fn check_market_panic(market_context: Option<&MarketContext>) -> Option<String> {
        let ctx = market_context?;

        if ctx.vix_value > PANIC_VIX {
            return Some(format!(
                "VIX extremely high ({:.1} > {PANIC_VIX}) - market panic",
                ctx.vix_value
            ));
        }

        if ctx.market_state == MarketState::Volatile && ctx.vix_value > VOLATILE_PANIC_VIX {
            return Some(format!(
                "Volatile market with high VIX ({:.1})",
                ctx.vix_value
            ));
        }

        None
    }

    fn check_triggers(technical: &TechnicalSnapshot) -> Vec<ReversalTrigger> {
        let mut triggers = Vec::with_capacity(3);

        let rsi_met = technical.rsi > RSI_RECOVERY;
        triggers.push(ReversalTrigger {
            name: "RSI Recovery".to_string(),
            met: rsi_met,
            value: technical.rsi,
            threshold: RSI_RECOVERY,
            description: format!(
                "RSI recovering from oversold (current: {:.1})",
                technical.rsi
            ),
        });

        let histogram = technical.macd_histogram();
        let macd_met = histogram > 0.0;
        triggers.push(ReversalTrigger {
            name: "MACD Momentum".to_string(),
            met: macd_met,
            value: histogram,
            threshold: 0.0,
            description: format!(
                "MACD histogram {} ({histogram:.2})",
                if macd_met { "positive" } else { "negative" }
            ),
        });

        match technical.volume_ratio {
            Some(ratio) => {
                let volume_met = ratio > VOLUME_SPIKE_RATIO;
                triggers.push(ReversalTrigger {
                    name: "Volume Spike".to_string(),
                    met: volume_met,
                    value: ratio,
                    threshold: VOLUME_SPIKE_RATIO,
                    description: format!(
                        "Volume {} ({ratio:.1}x average)",
                        if volume_met { "spike" } else { "normal" }
                    ),
                });
            }
            None => triggers.push(ReversalTrigger {
                name: "Volume Spike".to_string(),
                met: false,
                value: 0.0,
                threshold: VOLUME_SPIKE_RATIO,
                description: "Insufficient data for volume analysis".to_string(),
            }),
        }

        triggers
    }
}

impl Default for ReversalWatchDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{AnalyzerSignal, IndexSummary, VixLevel};
    use chrono::Utc;

    fn oversold_technical() -> TechnicalSnapshot {
        TechnicalSnapshot {
            signal: AnalyzerSignal::from_score(-0.5, 0.8, 0.2, 0.3),
            last_price: 92.0,
            rsi: 20.0,
            macd: -1.5,
            macd_signal: -1.0,
            ma_20: 100.0,
            ma_50: 104.0,
            ma_200: 110.0,
            atr: 2.0,
            support_levels: vec![88.0],
            resistance_levels: vec![101.0],
            volume_ratio: Some(1.0),
            regime: TechRegime::OversoldZone,
        }
    }

    fn sound_fundamental() -> FundamentalSnapshot {
        FundamentalSnapshot {
            signal: AnalyzerSignal::from_score(0.3, 0.9, 0.2, 0.3),
            pe_ratio: Some(20.8),
            pb_ratio: Some(2.5),
            debt_to_equity: Some(1.2),
            eps: Some(4.1),
            revenue_growth: Some(0.3),
        }
    }

    fn calm_context(vix: f64, state: MarketState) -> MarketContext {
        MarketContext {
            market_state: state,
            vix_level: VixLevel::from_value(vix),
            vix_value: vix,
            primary_index: IndexSummary::new(100.0, 99.0, 100.5, None),
            secondary_index: IndexSummary::new(100.0, 99.0, 100.5, None),
            market_signal_quality: 0.5,
            market_favorability: 0.5,
            as_of: Utc::now(),
        }
    }

    #[test]
    fn test_watch_only_with_no_triggers_met() {
        // RSI deep, histogram negative, volume unremarkable
        let mut technical = oversold_technical();
        technical.rsi = 11.7;
        technical.volume_ratio = Some(1.1);
        let ctx = calm_context(14.2, MarketState::Neutral);

        let watch = ReversalWatchDetector::new()
            .detect("ACME", &technical, &sound_fundamental(), Some(&ctx))
            .expect("setup expected");

        assert_eq!(watch.status, ReversalStatus::WatchOnly);
        assert_eq!(watch.triggers.iter().filter(|t| t.met).count(), 0);
        assert!((watch.confidence - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_triggered_when_all_triggers_met() {
        let mut technical = oversold_technical();
        technical.rsi = 33.0;
        technical.macd = -0.4;
        technical.macd_signal = -0.8; // histogram positive
        technical.volume_ratio = Some(2.1);
        let ctx = calm_context(16.0, MarketState::Neutral);

        let watch = ReversalWatchDetector::new()
            .detect("ACME", &technical, &sound_fundamental(), Some(&ctx))
            .expect("setup expected");

        assert_eq!(watch.status, ReversalStatus::Triggered);
        assert!((watch.confidence - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_partial_triggers_scale_confidence() {
        let detector = ReversalWatchDetector::new();
        let ctx = calm_context(16.0, MarketState::Neutral);

        let mut one = oversold_technical();
        one.rsi = 33.0; // only RSI recovers
        let watch = detector
            .detect("ACME", &one, &sound_fundamental(), Some(&ctx))
            .unwrap();
        assert!((watch.confidence - 0.55).abs() < 1e-12);

        let mut two = one.clone();
        two.macd = -0.4;
        two.macd_signal = -0.8;
        let watch = detector
            .detect("ACME", &two, &sound_fundamental(), Some(&ctx))
            .unwrap();
        assert!((watch.confidence - 0.65).abs() < 1e-12);
        assert_eq!(watch.status, ReversalStatus::WatchOnly);
    }

    #[test]
    fn test_not_oversold_yields_nothing() {
        let mut technical = oversold_technical();
        technical.regime = TechRegime::Consolidation;
        let ctx = calm_context(14.0, MarketState::Neutral);
        assert!(ReversalWatchDetector::new()
            .detect("ACME", &technical, &sound_fundamental(), Some(&ctx))
            .is_none());
    }

    #[test]
    fn test_poor_fundamentals_yield_nothing() {
        let detector = ReversalWatchDetector::new();
        let technical = oversold_technical();
        let ctx = calm_context(14.0, MarketState::Neutral);

        let mut pricey = sound_fundamental();
        pricey.pe_ratio = Some(42.0);
        assert!(detector
            .detect("ACME", &technical, &pricey, Some(&ctx))
            .is_none());

        let mut indebted = sound_fundamental();
        indebted.debt_to_equity = Some(3.4);
        assert!(detector
            .detect("ACME", &technical, &indebted, Some(&ctx))
            .is_none());

        let mut shrinking = sound_fundamental();
        shrinking.revenue_growth = Some(-22.0);
        assert!(detector
            .detect("ACME", &technical, &shrinking, Some(&ctx))
            .is_none());

        let mut negative = sound_fundamental();
        negative.signal.score = -0.1;
        assert!(detector
            .detect("ACME", &technical, &negative, Some(&ctx))
            .is_none());
    }

    #[test]
    fn test_missing_metrics_do_not_fail_the_gate() {
        let mut sparse = sound_fundamental();
        sparse.pe_ratio = None;
        sparse.pb_ratio = None;
        let ctx = calm_context(14.0, MarketState::Neutral);
        assert!(ReversalWatchDetector::new()
            .detect("ACME", &oversold_technical(), &sparse, Some(&ctx))
            .is_some());
    }

    #[test]
    fn test_market_panic_yields_nothing() {
        let detector = ReversalWatchDetector::new();
        let technical = oversold_technical();
        let fundamental = sound_fundamental();

        let panicked = calm_context(32.0, MarketState::Neutral);
        assert!(detector
            .detect("ACME", &technical, &fundamental, Some(&panicked))
            .is_none());

        let volatile = calm_context(26.0, MarketState::Volatile);
        assert!(detector
            .detect("ACME", &technical, &fundamental, Some(&volatile))
            .is_none());

        // VIX 26 outside a volatile state is not panic
        let tense = calm_context(26.0, MarketState::Neutral);
        assert!(detector
            .detect("ACME", &technical, &fundamental, Some(&tense))
            .is_some());
    }

    #[test]
    fn test_missing_context_assumes_no_panic() {
        assert!(ReversalWatchDetector::new()
            .detect("ACME", &oversold_technical(), &sound_fundamental(), None)
            .is_some());
    }

    #[test]
    fn test_triggers_report_values_and_thresholds() {
        let mut technical = oversold_technical();
        technical.rsi = 11.7;
        let ctx = calm_context(14.2, MarketState::Neutral);
        let watch = ReversalWatchDetector::new()
            .detect("ACME", &technical, &sound_fundamental(), Some(&ctx))
            .unwrap();

        let rsi = &watch.triggers[0];
        assert_eq!(rsi.name, "RSI Recovery");
        assert!((rsi.value - 11.7).abs() < 1e-12);
        assert!((rsi.threshold - 30.0).abs() < 1e-12);
        assert!(!rsi.met);

        let volume = &watch.triggers[2];
        assert!((volume.threshold - 1.5).abs() < 1e-12);
    }
}
