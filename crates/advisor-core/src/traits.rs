use async_trait::async_trait;

use crate::error::AdvisorError;
use crate::types::{Bar, FundamentalSnapshot, SentimentSignal, TechnicalSnapshot, WeightTriple};

/// Trait for sentiment analysis providers
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn sentiment(&self, symbol: &str) -> Result<SentimentSignal, AdvisorError>;
}

/// Trait for technical analysis providers
#[async_trait]
pub trait TechnicalProvider: Send + Sync {
    async fn technical(&self, symbol: &str) -> Result<TechnicalSnapshot, AdvisorError>;
}

/// Trait for fundamental analysis providers
#[async_trait]
pub trait FundamentalProvider: Send + Sync {
    async fn fundamental(&self, symbol: &str) -> Result<FundamentalSnapshot, AdvisorError>;
}

/// Trait for broad-market data sources feeding the context analyzer.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for a tracked index, most recent last. Enough history for
    /// a 50-day moving average is expected.
    async fn index_bars(&self, symbol: &str, days: u32) -> Result<Vec<Bar>, AdvisorError>;

    /// Current value of the volatility index.
    async fn volatility_index(&self) -> Result<f64, AdvisorError>;
}

/// Optional runtime weight source, typically backed by a performance tracker
/// that nudges weights toward historically accurate analyzers. A returned
/// triple is only honored if it sums to 1.0 with each component in
/// [0.15, 0.50].
pub trait WeightOverrideProvider: Send + Sync {
    fn runtime_weights(&self) -> Option<WeightTriple>;
}
