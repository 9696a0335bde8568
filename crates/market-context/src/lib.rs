use std::sync::RwLock;

use advisor_core::{
    AdvisorError, Bar, DefaultPolicy, Direction, IndexSummary, MarketContext, MarketDataProvider,
    MarketState, VixLevel,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

// When market data is unavailable this analyzer reports `None` and lets the
// consumers apply the shared DefaultPolicy fallbacks (neutral agreement leg,
// fail-open no-trade, static weights) instead of fabricating a context here.

/// VIX value at or above which the market is classified as panic outright.
pub const PANIC_VIX: f64 = 35.0;

/// Price distance from its MAs treated as a fully clear trend (5%).
const FULL_TREND_DISTANCE: f64 = 0.05;

/// Volume ratio treated as full confirmation of the trend day.
const FULL_CONFIRMATION_RATIO: f64 = 1.5;

/// Volume factor assumed when volume data is unavailable.
const DEFAULT_VOLUME_FACTOR: f64 = 0.7;

/// Classify the broad market from the two index summaries and the raw VIX.
/// First match wins.
pub fn determine_market_state(
    primary: &IndexSummary,
    secondary: &IndexSummary,
    vix: f64,
) -> MarketState {
    if vix >= PANIC_VIX {
        return MarketState::Panic;
    }

    let trends_aligned =
        primary.trend == secondary.trend && primary.trend != Direction::Neutral;
    if vix >= VixLevel::HIGH_MAX && !trends_aligned {
        return MarketState::Volatile;
    }

    match (primary.trend, secondary.trend) {
        (Direction::Bullish, Direction::Bullish) => MarketState::Bullish,
        (Direction::Bearish, Direction::Bearish) => MarketState::Bearish,
        _ => MarketState::Neutral,
    }
}

/// How clean the broad-market trend signal is, 0.0 to 1.0.
///
/// Weighted blend of price distance from the moving averages (far = clear
/// trend), volume confirmation, and trend agreement between the two indices.
/// Each sub-factor is clamped before weighting.
pub fn signal_quality(primary: &IndexSummary, secondary: &IndexSummary) -> f64 {
    let distance_factor = |index: &IndexSummary| -> f64 {
        if index.ma_20 <= 0.0 || index.ma_50 <= 0.0 {
            return 0.5;
        }
        let d20 = (index.price - index.ma_20).abs() / index.ma_20;
        let d50 = (index.price - index.ma_50).abs() / index.ma_50;
        (((d20 + d50) / 2.0) / FULL_TREND_DISTANCE).clamp(0.0, 1.0)
    };
    let distance = (distance_factor(primary) + distance_factor(secondary)) / 2.0;

    let volume = primary
        .volume_ratio
        .map(|ratio| (ratio / FULL_CONFIRMATION_RATIO).clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_VOLUME_FACTOR);

    let consistency = if primary.trend == secondary.trend {
        if primary.trend == Direction::Neutral {
            0.6
        } else {
            1.0
        }
    } else {
        0.3
    };

    (distance * 0.4 + volume * 0.2 + consistency * 0.4).clamp(0.0, 1.0)
}

/// How favorable conditions are for a long position, 0.0 to 1.0.
///
/// Constraints applied after the weighted blend, in order: bearish caps at
/// 0.40, very-high volatility caps at 0.25, bullish floors at 0.70.
pub fn favorability(
    state: MarketState,
    vix_level: VixLevel,
    primary_trend: Direction,
    secondary_trend: Direction,
) -> f64 {
    let state_score = match state {
        MarketState::Bullish => 1.0,
        MarketState::Neutral => 0.5,
        MarketState::Volatile => 0.25,
        MarketState::Bearish | MarketState::Panic => 0.0,
    };

    let vix_score = match vix_level {
        VixLevel::Low => 1.0,
        VixLevel::Moderate => 0.7,
        VixLevel::High => 0.4,
        VixLevel::VeryHigh => 0.1,
    };

    let bullish_count = [primary_trend, secondary_trend]
        .iter()
        .filter(|&&t| t == Direction::Bullish)
        .count();
    let breadth_score = match bullish_count {
        2 => 1.0,
        1 => 0.5,
        _ => 0.0,
    };

    let mut score: f64 = state_score * 0.6 + vix_score * 0.25 + breadth_score * 0.15;

    if state == MarketState::Bearish {
        score = score.min(0.40);
    }
    if vix_level == VixLevel::VeryHigh {
        score = score.min(0.25);
    }
    if state == MarketState::Bullish {
        score = score.max(0.70);
    }

    score.clamp(0.0, 1.0)
}

/// Reduce an index's bar history to its summary (price, MAs, volume ratio).
/// Falls back gracefully when history is short, the way a thin feed does
/// around new listings or holidays.
pub fn summarize_index(bars: &[Bar]) -> Result<IndexSummary, AdvisorError> {
    let last = bars
        .last()
        .ok_or_else(|| AdvisorError::InsufficientData("no bars for index".to_string()))?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let (ma_20, ma_50) = if closes.len() >= 50 {
        let tail = &closes[closes.len() - 50..];
        let ma_20 = tail[30..].iter().sum::<f64>() / 20.0;
        let ma_50 = tail.iter().sum::<f64>() / 50.0;
        (ma_20, ma_50)
    } else if closes.len() >= 20 {
        let tail = &closes[closes.len() - 20..];
        let ma_20 = tail.iter().sum::<f64>() / 20.0;
        (ma_20, ma_20)
    } else {
        (last.close, last.close)
    };

    let volume_ratio = if bars.len() >= 20 {
        let recent = &bars[bars.len() - 20..];
        let avg_volume = recent.iter().map(|b| b.volume).sum::<f64>() / recent.len() as f64;
        if avg_volume > 0.0 {
            Some(last.volume / avg_volume)
        } else {
            None
        }
    } else {
        None
    };

    Ok(IndexSummary::new(last.close, ma_20, ma_50, volume_ratio))
}

struct CacheEntry {
    context: MarketContext,
    cached_at: DateTime<Utc>,
}

/// Reduces broad-market index and volatility data into the `MarketContext`
/// consumed by the risk logic.
///
/// The context is global (not per-symbol), so results are cached under a
/// single slot with a TTL. Provider failures never propagate as errors: the
/// analyzer reports the context as unavailable and callers proceed with
/// reduced confidence.
pub struct MarketContextAnalyzer<P> {
    provider: P,
    policy: DefaultPolicy,
    primary_symbol: String,
    secondary_symbol: String,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
}

impl<P: MarketDataProvider> MarketContextAnalyzer<P> {
    pub const DEFAULT_PRIMARY: &'static str = "SPY";
    pub const DEFAULT_SECONDARY: &'static str = "QQQ";
    const HISTORY_DAYS: u32 = 90;

    pub fn new(provider: P, policy: DefaultPolicy) -> Self {
        Self::with_symbols(
            provider,
            policy,
            Self::DEFAULT_PRIMARY,
            Self::DEFAULT_SECONDARY,
        )
    }

    pub fn with_symbols(
        provider: P,
        policy: DefaultPolicy,
        primary_symbol: &str,
        secondary_symbol: &str,
    ) -> Self {
        Self {
            provider,
            policy,
            primary_symbol: primary_symbol.to_string(),
            secondary_symbol: secondary_symbol.to_string(),
            cache_ttl: Duration::minutes(15),
            cache: RwLock::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Current market context, served from cache within the TTL window.
    /// `None` means market data is unavailable right now; failures are not
    /// cached, so the next call retries.
    pub async fn market_context(&self) -> Option<MarketContext> {
        let now = Utc::now();
        if let Some(entry) = self.cache.read().expect("context cache poisoned").as_ref() {
            if now - entry.cached_at < self.cache_ttl {
                debug!("using cached market context");
                return Some(entry.context.clone());
            }
        }
        self.refresh().await
    }

    /// Recompute the context from fresh data, bypassing the cache.
    pub async fn refresh(&self) -> Option<MarketContext> {
        let context = match self.compute().await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "market data unavailable, proceeding without context");
                return None;
            }
        };

        let mut cache = self.cache.write().expect("context cache poisoned");
        *cache = Some(CacheEntry {
            context: context.clone(),
            cached_at: Utc::now(),
        });
        Some(context)
    }

    async fn compute(&self) -> Result<MarketContext, AdvisorError> {
        let primary_bars = self
            .provider
            .index_bars(&self.primary_symbol, Self::HISTORY_DAYS)
            .await?;
        let secondary_bars = self
            .provider
            .index_bars(&self.secondary_symbol, Self::HISTORY_DAYS)
            .await?;

        let primary = summarize_index(&primary_bars)?;
        let secondary = summarize_index(&secondary_bars)?;

        let vix_value = match self.provider.volatility_index().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, fallback = self.policy.fallback_vix, "VIX unavailable");
                self.policy.fallback_vix
            }
        };
        let vix_level = VixLevel::from_value(vix_value);

        let market_state = determine_market_state(&primary, &secondary, vix_value);
        let market_signal_quality = signal_quality(&primary, &secondary);
        let market_favorability =
            favorability(market_state, vix_level, primary.trend, secondary.trend);

        info!(
            state = market_state.to_label(),
            vix = vix_value,
            quality = market_signal_quality,
            favorability = market_favorability,
            "market context refreshed"
        );

        Ok(MarketContext {
            market_state,
            vix_level,
            vix_value,
            primary_index: primary,
            secondary_index: secondary,
            market_signal_quality,
            market_favorability,
            as_of: Utc::now(),
        })
    }
}
