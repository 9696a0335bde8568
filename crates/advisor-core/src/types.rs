use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default threshold for bucketing a score into a direction.
pub const DIRECTION_THRESHOLD: f64 = 0.2;

/// Strength multiplier applied when a signal's direction is neutral.
pub const NEUTRAL_DAMPING: f64 = 0.3;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Directional bucket shared by all signal sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Bucket a score in [-1, 1] using a symmetric threshold.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Direction::Bullish
        } else if score < -threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

/// Output shape shared by the three analyzers.
///
/// `score` is the signed analyzer-specific signal in [-1, 1]; `confidence`
/// measures how reliable this particular reading is (data sufficiency), not
/// how profitable the trade might be.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyzerSignal {
    pub score: f64,
    pub direction: Direction,
    pub strength: f64,
    pub confidence: f64,
}

impl AnalyzerSignal {
    /// Derive direction and strength from a raw score.
    ///
    /// Strength is |score|, damped when the direction lands in the neutral
    /// band: a score near zero carries little conviction either way.
    pub fn from_score(score: f64, confidence: f64, threshold: f64, neutral_damping: f64) -> Self {
        let direction = Direction::from_score(score, threshold);
        let strength = match direction {
            Direction::Neutral => score.abs() * neutral_damping,
            _ => score.abs(),
        };
        Self {
            score,
            direction,
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Stand-in for a missing or unparseable analyzer output.
    pub fn degraded() -> Self {
        Self {
            score: 0.0,
            direction: Direction::Neutral,
            strength: 0.0,
            confidence: 0.0,
        }
    }
}

/// Aggregated sentiment reading plus the sample size behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSignal {
    pub signal: AnalyzerSignal,
    /// Number of scored news/social items backing the reading.
    pub source_count: usize,
}

impl SentimentSignal {
    pub fn degraded() -> Self {
        Self {
            signal: AnalyzerSignal::degraded(),
            source_count: 0,
        }
    }
}

/// Technical regime classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechRegime {
    BullishTrend,
    BearishTrend,
    OversoldZone,
    OverboughtZone,
    Consolidation,
    Neutral,
}

impl TechRegime {
    /// Classify the technical regime from the standard indicator set.
    ///
    /// Oversold/overbought zones take priority since they flag potential
    /// reversals; trend regimes require full MA alignment plus momentum.
    pub fn classify(price: f64, rsi: f64, macd: f64, ma_20: f64, ma_50: f64, ma_200: f64) -> Self {
        if rsi < 25.0 && macd < 0.0 && price < ma_20 {
            return TechRegime::OversoldZone;
        }
        if rsi > 75.0 && macd > 0.0 && price > ma_20 {
            return TechRegime::OverboughtZone;
        }

        let bullish_alignment = price > ma_20 && ma_20 > ma_50 && ma_50 > ma_200;
        if bullish_alignment && macd > 0.0 && (50.0..=70.0).contains(&rsi) {
            return TechRegime::BullishTrend;
        }

        let bearish_alignment = price < ma_20 && ma_20 < ma_50 && ma_50 < ma_200;
        if bearish_alignment && macd < 0.0 && (30.0..=50.0).contains(&rsi) {
            return TechRegime::BearishTrend;
        }

        TechRegime::Consolidation
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            TechRegime::BullishTrend => "bullish-trend",
            TechRegime::BearishTrend => "bearish-trend",
            TechRegime::OversoldZone => "oversold-zone",
            TechRegime::OverboughtZone => "overbought-zone",
            TechRegime::Consolidation => "consolidation",
            TechRegime::Neutral => "neutral",
        }
    }
}

/// Technical analyzer output: the directional signal plus the indicator
/// values downstream risk logic reads directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub signal: AnalyzerSignal,
    pub last_price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub ma_20: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub atr: f64,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    /// Current daily volume relative to its 20-day average.
    pub volume_ratio: Option<f64>,
    pub regime: TechRegime,
}

impl TechnicalSnapshot {
    pub fn degraded() -> Self {
        Self {
            signal: AnalyzerSignal::degraded(),
            last_price: 0.0,
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            ma_20: 0.0,
            ma_50: 0.0,
            ma_200: 0.0,
            atr: 0.0,
            support_levels: Vec::new(),
            resistance_levels: Vec::new(),
            volume_ratio: None,
            regime: TechRegime::Neutral,
        }
    }

    pub fn macd_histogram(&self) -> f64 {
        self.macd - self.macd_signal
    }
}

/// Fundamental analyzer output with the ratio fields the quality gates read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub signal: AnalyzerSignal,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub eps: Option<f64>,
    /// Revenue growth in percent (e.g. 12.5 = +12.5% YoY).
    pub revenue_growth: Option<f64>,
}

impl FundamentalSnapshot {
    pub fn degraded() -> Self {
        Self {
            signal: AnalyzerSignal::degraded(),
            pe_ratio: None,
            pb_ratio: None,
            debt_to_equity: None,
            eps: None,
            revenue_growth: None,
        }
    }

    /// Count of the core valuation metrics that are absent. Feeds the
    /// data-quality penalty ledger.
    pub fn missing_metric_count(&self) -> usize {
        [
            self.pe_ratio.is_none(),
            self.pb_ratio.is_none(),
            self.revenue_growth.is_none(),
        ]
        .iter()
        .filter(|&&missing| missing)
        .count()
    }
}

/// Broad market classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketState {
    Bullish,
    Bearish,
    Neutral,
    Volatile,
    Panic,
}

impl MarketState {
    pub fn to_label(&self) -> &'static str {
        match self {
            MarketState::Bullish => "bullish",
            MarketState::Bearish => "bearish",
            MarketState::Neutral => "neutral",
            MarketState::Volatile => "volatile",
            MarketState::Panic => "panic",
        }
    }

    /// Directional read of the state, used as the fourth agreement source.
    /// Volatile says nothing about direction; panic is a bearish extreme.
    pub fn direction(&self) -> Direction {
        match self {
            MarketState::Bullish => Direction::Bullish,
            MarketState::Bearish | MarketState::Panic => Direction::Bearish,
            MarketState::Neutral | MarketState::Volatile => Direction::Neutral,
        }
    }
}

/// Volatility index tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VixLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl VixLevel {
    pub const LOW_MAX: f64 = 15.0;
    pub const MODERATE_MAX: f64 = 20.0;
    pub const HIGH_MAX: f64 = 25.0;

    pub fn from_value(vix: f64) -> Self {
        if vix < Self::LOW_MAX {
            VixLevel::Low
        } else if vix < Self::MODERATE_MAX {
            VixLevel::Moderate
        } else if vix < Self::HIGH_MAX {
            VixLevel::High
        } else {
            VixLevel::VeryHigh
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            VixLevel::Low => "low",
            VixLevel::Moderate => "moderate",
            VixLevel::High => "high",
            VixLevel::VeryHigh => "very_high",
        }
    }
}

/// Single tracked index reduced to its trend inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub price: f64,
    pub ma_20: f64,
    pub ma_50: f64,
    /// Latest volume relative to its 20-day average, when known.
    pub volume_ratio: Option<f64>,
    pub trend: Direction,
}

impl IndexSummary {
    pub fn new(price: f64, ma_20: f64, ma_50: f64, volume_ratio: Option<f64>) -> Self {
        let trend = if price <= 0.0 || ma_20 <= 0.0 || ma_50 <= 0.0 {
            Direction::Neutral
        } else if price > ma_20 && price > ma_50 {
            Direction::Bullish
        } else if price < ma_20 && price < ma_50 {
            Direction::Bearish
        } else {
            Direction::Neutral
        };
        Self {
            price,
            ma_20,
            ma_50,
            volume_ratio,
            trend,
        }
    }

    /// Signed deviation of price from its 50-day MA as a fraction
    /// (-0.03 = 3% below).
    pub fn pct_vs_50dma(&self) -> f64 {
        if self.ma_50 <= 0.0 {
            return 0.0;
        }
        (self.price - self.ma_50) / self.ma_50
    }
}

/// Broad-market snapshot consumed by the risk logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub market_state: MarketState,
    pub vix_level: VixLevel,
    pub vix_value: f64,
    pub primary_index: IndexSummary,
    pub secondary_index: IndexSummary,
    /// How clean/consistent the broad-market trend signal is, 0.0 to 1.0.
    pub market_signal_quality: f64,
    /// How favorable conditions are for a long position, 0.0 to 1.0.
    pub market_favorability: f64,
    pub as_of: DateTime<Utc>,
}

/// No-trade severity tier. Ordering matters: rules escalate to the
/// highest matched tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn to_label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Result of the danger-condition scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoTradeSignal {
    pub is_no_trade: bool,
    pub severity: Severity,
    /// Every matched rule, in evaluation order.
    pub reasons: Vec<String>,
    pub suggested_action: String,
}

/// One named entry in a penalty ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyContribution {
    pub name: String,
    pub amount: f64,
}

/// Itemized confidence inputs, returned alongside the final number so the
/// caller can show why confidence is what it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub sentiment_confidence: f64,
    pub technical_confidence: f64,
    pub fundamental_confidence: f64,
    pub market_signal_quality: f64,
    pub market_favorability: f64,
    pub agreement_score: f64,
    /// Cumulative data-quality penalty, capped at 0.30.
    pub data_quality_penalty: f64,
    pub penalty_contributions: Vec<PenaltyContribution>,
}

/// Per-analyzer weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTriple {
    pub sentiment: f64,
    pub technical: f64,
    pub fundamental: f64,
}

impl WeightTriple {
    pub const SUM_TOLERANCE: f64 = 1e-6;

    pub fn sum(&self) -> f64 {
        self.sentiment + self.technical + self.fundamental
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < Self::SUM_TOLERANCE
    }
}

/// Provenance of the weights applied to a specific recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightSource {
    DynamicBullish,
    DynamicNeutral,
    DynamicBearish,
    DynamicVolatile,
    DynamicPanic,
    Static,
    Override,
}

impl WeightSource {
    pub fn to_label(&self) -> &'static str {
        match self {
            WeightSource::DynamicBullish => "dynamic-bullish",
            WeightSource::DynamicNeutral => "dynamic-neutral",
            WeightSource::DynamicBearish => "dynamic-bearish",
            WeightSource::DynamicVolatile => "dynamic-volatile",
            WeightSource::DynamicPanic => "dynamic-panic",
            WeightSource::Static => "static",
            WeightSource::Override => "override",
        }
    }
}

/// The weights actually applied this run, with their provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeWeights {
    pub weights: WeightTriple,
    pub source: WeightSource,
}

/// Per-analyzer weighted contributions to the raw score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalContributions {
    pub sentiment: f64,
    pub technical: f64,
    pub fundamental: f64,
}

/// Named risk penalties. Each is zero or negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskPenalties {
    pub market: f64,
    pub no_trade: f64,
    pub volatility: f64,
    pub data: f64,
}

impl RiskPenalties {
    pub fn total(&self) -> f64 {
        self.market + self.no_trade + self.volatility + self.data
    }
}

/// Final directional call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn to_label(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

/// Inclusive price band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

/// Precise entry, stop, and target levels for a BUY setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradeLevels {
    pub ideal_entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub risk_per_trade_percent: f64,
    pub risk_reward_ratio: f64,
    pub position_size_percent: f64,
}

/// The engine's final, explainable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub action: Action,
    pub confidence: f64,
    pub raw_score: f64,
    pub adjusted_score: f64,
    pub contributions: SignalContributions,
    pub penalties: RiskPenalties,
    pub runtime_weights: RuntimeWeights,
    pub entry_range: Option<PriceRange>,
    pub exit_range: Option<PriceRange>,
    pub trade_levels: Option<TradeLevels>,
    pub confidence_breakdown: ConfidenceBreakdown,
    pub reasoning: String,
}

/// One boolean reversal check with its observed value and threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalTrigger {
    pub name: String,
    pub met: bool,
    pub value: f64,
    pub threshold: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReversalStatus {
    WatchOnly,
    Triggered,
}

impl ReversalStatus {
    pub fn to_label(&self) -> &'static str {
        match self {
            ReversalStatus::WatchOnly => "watch-only",
            ReversalStatus::Triggered => "triggered",
        }
    }
}

/// A candidate bottoming setup: oversold technicals, sound fundamentals,
/// calm market. Produced only when all three preconditions hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalWatch {
    pub symbol: String,
    pub status: ReversalStatus,
    pub triggers: Vec<ReversalTrigger>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Complete per-symbol result assembled by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAssessment {
    pub symbol: String,
    pub current_price: f64,
    pub sentiment: SentimentSignal,
    pub technical: TechnicalSnapshot,
    pub fundamental: FundamentalSnapshot,
    pub market_context: Option<MarketContext>,
    pub no_trade: NoTradeSignal,
    pub recommendation: Recommendation,
    pub reversal_watch: Option<ReversalWatch>,
    pub generated_at: DateTime<Utc>,
}
