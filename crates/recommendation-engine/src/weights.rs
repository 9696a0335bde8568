use advisor_core::{
    AdvisorConfig, AdvisorError, MarketState, RuntimeWeights, WeightSource, WeightTriple,
};
use tracing::{info, warn};

/// Bounds a performance-tracking collaborator's weight override must respect.
pub const OVERRIDE_MIN_WEIGHT: f64 = 0.15;
pub const OVERRIDE_MAX_WEIGHT: f64 = 0.50;

/// Regime-dependent weight table.
///
/// Momentum leads in a bullish tape; without a trend, value matters more;
/// in bearish or volatile regimes the engine anchors to intrinsic value and
/// discounts sentiment. Panic reuses the defensive row.
pub fn weights_for(state: MarketState) -> RuntimeWeights {
    let (weights, source) = match state {
        MarketState::Bullish => (
            WeightTriple {
                sentiment: 0.30,
                technical: 0.40,
                fundamental: 0.30,
            },
            WeightSource::DynamicBullish,
        ),
        MarketState::Neutral => (
            WeightTriple {
                sentiment: 0.25,
                technical: 0.35,
                fundamental: 0.40,
            },
            WeightSource::DynamicNeutral,
        ),
        MarketState::Bearish => (
            WeightTriple {
                sentiment: 0.15,
                technical: 0.35,
                fundamental: 0.50,
            },
            WeightSource::DynamicBearish,
        ),
        MarketState::Volatile => (
            WeightTriple {
                sentiment: 0.15,
                technical: 0.35,
                fundamental: 0.50,
            },
            WeightSource::DynamicVolatile,
        ),
        MarketState::Panic => (
            WeightTriple {
                sentiment: 0.15,
                technical: 0.35,
                fundamental: 0.50,
            },
            WeightSource::DynamicPanic,
        ),
    };
    RuntimeWeights { weights, source }
}

/// A runtime override is honored only if it sums to 1.0 and keeps every
/// component inside the tracker's own [0.15, 0.50] constraints.
pub fn validate_override(weights: &WeightTriple) -> Result<(), AdvisorError> {
    if !weights.is_normalized() {
        return Err(AdvisorError::InvalidData(format!(
            "override weights must sum to 1.0, got {}",
            weights.sum()
        )));
    }
    for (name, w) in [
        ("sentiment", weights.sentiment),
        ("technical", weights.technical),
        ("fundamental", weights.fundamental),
    ] {
        if !(OVERRIDE_MIN_WEIGHT..=OVERRIDE_MAX_WEIGHT).contains(&w) {
            return Err(AdvisorError::InvalidData(format!(
                "override {name} weight {w} outside [{OVERRIDE_MIN_WEIGHT}, {OVERRIDE_MAX_WEIGHT}]"
            )));
        }
    }
    Ok(())
}

/// Select the weights for this run: a valid override wins outright, then the
/// regime table, then the static config fallback when no context exists.
/// An invalid override is advisory input gone bad, so it is logged and
/// ignored rather than treated as a configuration failure.
pub fn resolve_weights(
    config: &AdvisorConfig,
    market_state: Option<MarketState>,
    weight_override: Option<WeightTriple>,
) -> RuntimeWeights {
    if let Some(weights) = weight_override {
        match validate_override(&weights) {
            Ok(()) => {
                info!("using runtime weight override");
                return RuntimeWeights {
                    weights,
                    source: WeightSource::Override,
                };
            }
            Err(e) => warn!(error = %e, "ignoring invalid weight override"),
        }
    }

    match market_state {
        Some(state) => {
            let selected = weights_for(state);
            info!(
                source = selected.source.to_label(),
                sentiment = selected.weights.sentiment,
                technical = selected.weights.technical,
                fundamental = selected.weights.fundamental,
                "using dynamic market weights"
            );
            selected
        }
        None => {
            info!("no market context, using static config weights");
            RuntimeWeights {
                weights: config.static_weights(),
                source: WeightSource::Static,
            }
        }
    }
}
