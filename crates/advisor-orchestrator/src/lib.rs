use std::sync::Arc;

use advisor_core::{
    AdvisorConfig, DefaultPolicy, FundamentalProvider, FundamentalSnapshot, MarketDataProvider,
    SentimentProvider, SentimentSignal, StockAssessment, TechnicalProvider, TechnicalSnapshot,
    WeightOverrideProvider,
};
use anyhow::Context;
use chrono::Utc;
use market_context::MarketContextAnalyzer;
use no_trade_detector::NoTradeDetector;
use recommendation_engine::RecommendationEngine;
use reversal_watch::ReversalWatchDetector;
use tracing::{info, warn};

/// Sequences a full per-symbol analysis: analyzer fan-out, market context,
/// no-trade gate, recommendation, reversal watch.
///
/// The three analyzers run concurrently; they are independent and read-only.
/// Every data failure degrades in place, so `analyze` always produces an
/// assessment.
pub struct AdvisorOrchestrator<M: MarketDataProvider> {
    sentiment_provider: Arc<dyn SentimentProvider>,
    technical_provider: Arc<dyn TechnicalProvider>,
    fundamental_provider: Arc<dyn FundamentalProvider>,
    context_analyzer: MarketContextAnalyzer<M>,
    no_trade_detector: NoTradeDetector,
    engine: RecommendationEngine,
    reversal_detector: ReversalWatchDetector,
    weight_provider: Option<Arc<dyn WeightOverrideProvider>>,
}

impl<M: MarketDataProvider> AdvisorOrchestrator<M> {
    pub fn new(
        config: AdvisorConfig,
        sentiment_provider: Arc<dyn SentimentProvider>,
        technical_provider: Arc<dyn TechnicalProvider>,
        fundamental_provider: Arc<dyn FundamentalProvider>,
        market_provider: M,
    ) -> anyhow::Result<Self> {
        let policy = DefaultPolicy::default();
        let context_analyzer = MarketContextAnalyzer::new(market_provider, policy)
            .with_cache_ttl(chrono::Duration::seconds(config.context_cache_ttl_secs as i64));
        let no_trade_detector = NoTradeDetector::new(&config, policy);
        let engine = RecommendationEngine::new(config)
            .context("advisor configuration rejected")?
            .with_policy(policy);

        Ok(Self {
            sentiment_provider,
            technical_provider,
            fundamental_provider,
            context_analyzer,
            no_trade_detector,
            engine,
            reversal_detector: ReversalWatchDetector::new(),
            weight_provider: None,
        })
    }

    /// Attach a performance-tracking collaborator that may override the
    /// dynamic weight table at runtime.
    pub fn with_weight_provider(mut self, provider: Arc<dyn WeightOverrideProvider>) -> Self {
        self.weight_provider = Some(provider);
        self
    }

    /// Run the full analysis for one symbol.
    pub async fn analyze(&self, symbol: &str) -> StockAssessment {
        info!(symbol, "starting analysis");

        let (sentiment_result, technical_result, fundamental_result, market_context) = tokio::join!(
            self.sentiment_provider.sentiment(symbol),
            self.technical_provider.technical(symbol),
            self.fundamental_provider.fundamental(symbol),
            self.context_analyzer.market_context(),
        );

        let sentiment = sentiment_result.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "sentiment unavailable, degrading");
            SentimentSignal::degraded()
        });
        let technical = technical_result.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "technical analysis unavailable, degrading");
            TechnicalSnapshot::degraded()
        });
        let fundamental = fundamental_result.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "fundamentals unavailable, degrading");
            FundamentalSnapshot::degraded()
        });

        let no_trade = self.no_trade_detector.check(market_context.as_ref());

        let weight_override = self
            .weight_provider
            .as_ref()
            .and_then(|p| p.runtime_weights());
        let engine = match weight_override {
            Some(weights) => self.engine.clone().with_weight_override(Some(weights)),
            None => self.engine.clone(),
        };

        let recommendation = engine.generate(
            symbol,
            &sentiment,
            &technical,
            &fundamental,
            market_context.as_ref(),
            &no_trade,
        );

        let reversal_watch = self.reversal_detector.detect(
            symbol,
            &technical,
            &fundamental,
            market_context.as_ref(),
        );

        info!(
            symbol,
            action = recommendation.action.to_label(),
            confidence = recommendation.confidence,
            reversal = reversal_watch.is_some(),
            "analysis complete"
        );

        StockAssessment {
            symbol: symbol.to_string(),
            current_price: technical.last_price,
            sentiment,
            technical,
            fundamental,
            market_context,
            no_trade,
            recommendation,
            reversal_watch,
            generated_at: Utc::now(),
        }
    }
}
