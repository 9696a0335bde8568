use advisor_core::{
    Action, AdvisorConfig, AdvisorError, DefaultPolicy, FundamentalSnapshot, MarketContext,
    NoTradeSignal, Recommendation, SentimentSignal, SignalContributions, TechnicalSnapshot,
    WeightTriple,
};
use statrs::statistics::Statistics;
use tracing::info;

use crate::confidence::calculate_confidence;
use crate::levels::{entry_range, exit_range, trade_levels};
use crate::penalty::{data_quality_ledger, risk_penalties};
use crate::reasoning::compose_reasoning;
use crate::weights::resolve_weights;

/// Turns the three analyzer signals plus market risk inputs into one final,
/// explainable recommendation.
///
/// The engine is a pure function of its inputs: no I/O, no clock, no shared
/// state. Data problems degrade scores and confidence; only configuration
/// problems are hard errors, and those are rejected at construction.
#[derive(Clone)]
pub struct RecommendationEngine {
    config: AdvisorConfig,
    policy: DefaultPolicy,
    weight_override: Option<WeightTriple>,
}

impl RecommendationEngine {
    pub fn new(mut config: AdvisorConfig) -> Result<Self, AdvisorError> {
        config.normalize_weights()?;
        config.validate()?;
        Ok(Self {
            config,
            policy: DefaultPolicy::default(),
            weight_override: None,
        })
    }

    pub fn with_policy(mut self, policy: DefaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Install a runtime weight override from a performance-tracking
    /// collaborator. Validated per run; an invalid triple is ignored.
    pub fn with_weight_override(mut self, weights: Option<WeightTriple>) -> Self {
        self.weight_override = weights;
        self
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Generate a recommendation. Always succeeds: missing inputs should be
    /// passed as the degraded stand-ins, which surface through the
    /// data-quality penalty and lower confidence rather than as errors.
    pub fn generate(
        &self,
        symbol: &str,
        sentiment: &SentimentSignal,
        technical: &TechnicalSnapshot,
        fundamental: &FundamentalSnapshot,
        market_context: Option<&MarketContext>,
        no_trade: &NoTradeSignal,
    ) -> Recommendation {
        let runtime_weights = resolve_weights(
            &self.config,
            market_context.map(|ctx| ctx.market_state),
            self.weight_override,
        );
        let weights = runtime_weights.weights;

        let contributions = SignalContributions {
            sentiment: sentiment.signal.score * weights.sentiment,
            technical: technical.signal.score * weights.technical,
            fundamental: fundamental.signal.score * weights.fundamental,
        };
        let raw_score = contributions.sentiment + contributions.technical + contributions.fundamental;

        let (data_quality_penalty, ledger) =
            data_quality_ledger(sentiment, fundamental, market_context.is_some());
        let penalties = risk_penalties(market_context, no_trade, data_quality_penalty);
        let adjusted_score = raw_score + penalties.total();

        // High disagreement between analyzers is its own decision path:
        // stand aside until the signals line up.
        let scores = [
            sentiment.signal.score,
            technical.signal.score,
            fundamental.signal.score,
        ];
        let score_spread = scores.iter().population_std_dev();
        let conflicting = score_spread > self.config.conflict_std_dev_threshold;

        let unblocked_action = if conflicting {
            Action::Hold
        } else if adjusted_score > self.config.action_threshold {
            Action::Buy
        } else if adjusted_score < -self.config.action_threshold {
            Action::Sell
        } else {
            Action::Hold
        };

        let buy_blocked = unblocked_action == Action::Buy && no_trade.is_no_trade;
        let action = if buy_blocked {
            Action::Hold
        } else {
            unblocked_action
        };

        let (confidence, confidence_breakdown) = calculate_confidence(
            sentiment,
            technical,
            fundamental,
            market_context,
            self.policy.neutral_signal_quality,
            self.policy.neutral_favorability,
            data_quality_penalty,
            ledger,
        );

        let current_price = technical.last_price;
        let (entry, exit, levels) = match action {
            Action::Buy if current_price > 0.0 => (
                Some(entry_range(current_price, technical)),
                None,
                trade_levels(current_price, technical),
            ),
            Action::Sell if current_price > 0.0 => {
                (None, Some(exit_range(current_price, technical)), None)
            }
            _ => (None, None, None),
        };

        let reasoning = compose_reasoning(
            action,
            confidence,
            raw_score,
            adjusted_score,
            &contributions,
            &penalties,
            sentiment,
            technical,
            fundamental,
            market_context,
            no_trade,
            buy_blocked,
            conflicting,
        );

        info!(
            symbol,
            action = action.to_label(),
            confidence,
            raw_score,
            adjusted_score,
            weights = runtime_weights.source.to_label(),
            "recommendation generated"
        );

        Recommendation {
            symbol: symbol.to_string(),
            action,
            confidence,
            raw_score,
            adjusted_score,
            contributions,
            penalties,
            runtime_weights,
            entry_range: entry,
            exit_range: exit,
            trade_levels: levels,
            confidence_breakdown,
            reasoning,
        }
    }
}
